use crate::{DeviceIndex, NetIndex};

/// A single terminal of a net or a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link(pub(crate) u32);

impl Link {
    pub(crate) fn from_index(index: usize) -> Link {
        Link(index.try_into().expect("link index too large"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn offset(self, offset: usize) -> Link {
        Link::from_index(self.index() + offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkDir {
    Passive,
    Input,
    Output,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkOwner {
    Net(NetIndex, usize),
    Device(DeviceIndex, usize),
}

impl LinkOwner {
    pub fn pin(self) -> usize {
        match self {
            LinkOwner::Net(_, pin) | LinkOwner::Device(_, pin) => pin,
        }
    }

    pub fn as_net(self) -> Option<NetIndex> {
        match self {
            LinkOwner::Net(net, _) => Some(net),
            LinkOwner::Device(..) => None,
        }
    }

    pub fn as_device(self) -> Option<DeviceIndex> {
        match self {
            LinkOwner::Device(device, _) => Some(device),
            LinkOwner::Net(..) => None,
        }
    }
}

/// Driver and consumer counts of a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct RingShape {
    pub inputs: usize,
    pub outputs: usize,
}

impl RingShape {
    pub const fn new(inputs: usize, outputs: usize) -> RingShape {
        RingShape { inputs, outputs }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LinkData {
    pub(crate) owner: LinkOwner,
    pub(crate) dir: LinkDir,
    pub(crate) next: Link,
    pub(crate) prev: Link,
}
