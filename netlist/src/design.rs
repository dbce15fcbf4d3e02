use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::link::LinkData;
use crate::{
    Device, DeviceIndex, DeviceKind, Link, LinkDir, LinkOwner, Net, NetIndex, NetKind, RingShape, LCA_ATTRIBUTE,
};

/// Owns every net and device of a circuit, and the rings joining their terminals.
///
/// Nets and devices are never removed, so their indices stay valid for the lifetime of the
/// design, including across additions made while a pass is iterating over it.
#[derive(Debug, Clone)]
pub struct Design {
    nets: IndexMap<String, Net>,
    devices: IndexMap<String, Device>,
    links: Vec<LinkData>,
    next_symbol: usize,
}

impl Design {
    pub fn new() -> Design {
        Design { nets: IndexMap::new(), devices: IndexMap::new(), links: vec![], next_symbol: 0 }
    }

    fn add_links(&mut self, pin_count: usize, owner: impl Fn(usize) -> (LinkOwner, LinkDir)) -> Link {
        let first = Link::from_index(self.links.len());
        for pin in 0..pin_count {
            let link = first.offset(pin);
            let (owner, dir) = owner(pin);
            self.links.push(LinkData { owner, dir, next: link, prev: link });
        }
        first
    }

    pub fn add_net(&mut self, name: impl Into<String>, kind: NetKind, pin_count: usize) -> NetIndex {
        let name = name.into();
        assert!(pin_count > 0, "net {name:?} must have at least one pin");
        if self.nets.contains_key(&name) {
            panic!("duplicate net {name:?}");
        }
        let index = NetIndex(self.nets.len());
        let first_pin = self.add_links(pin_count, |pin| (LinkOwner::Net(index, pin), LinkDir::Passive));
        self.nets.insert(name, Net::new(kind, first_pin, pin_count));
        index
    }

    pub fn add_device(&mut self, name: impl Into<String>, kind: DeviceKind, pin_count: usize) -> DeviceIndex {
        let name = name.into();
        if !kind.is_valid_pin_count(pin_count) {
            panic!("device {name:?} of kind {kind} cannot have {pin_count} pins");
        }
        if self.devices.contains_key(&name) {
            panic!("duplicate device {name:?}");
        }
        let index = DeviceIndex(self.devices.len());
        let first_pin = self.add_links(pin_count, |pin| (LinkOwner::Device(index, pin), kind.pin_dir(pin)));
        self.devices.insert(name, Device::new(kind, first_pin, pin_count));
        index
    }

    pub fn net(&self, index: NetIndex) -> &Net {
        &self.nets[index.0]
    }

    pub fn net_mut(&mut self, index: NetIndex) -> &mut Net {
        &mut self.nets[index.0]
    }

    pub fn net_name(&self, index: NetIndex) -> &str {
        self.nets.get_index(index.0).map(|(name, _)| name.as_str()).expect("net index out of range")
    }

    pub fn find_net(&self, name: &str) -> Option<NetIndex> {
        self.nets.get_index_of(name).map(NetIndex)
    }

    pub fn device(&self, index: DeviceIndex) -> &Device {
        &self.devices[index.0]
    }

    pub fn device_mut(&mut self, index: DeviceIndex) -> &mut Device {
        &mut self.devices[index.0]
    }

    pub fn device_name(&self, index: DeviceIndex) -> &str {
        self.devices.get_index(index.0).map(|(name, _)| name.as_str()).expect("device index out of range")
    }

    pub fn find_device(&self, name: &str) -> Option<DeviceIndex> {
        self.devices.get_index_of(name).map(DeviceIndex)
    }

    pub fn net_pin(&self, net: NetIndex, pin: usize) -> Link {
        self.net(net).pin(pin)
    }

    pub fn device_pin(&self, device: DeviceIndex, pin: usize) -> Link {
        self.device(device).pin(pin)
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn iter_nets(&self) -> impl Iterator<Item = NetIndex> + '_ {
        (0..self.nets.len()).map(NetIndex)
    }

    pub fn iter_devices(&self) -> impl Iterator<Item = DeviceIndex> + '_ {
        (0..self.devices.len()).map(DeviceIndex)
    }

    /// Returns the nets present right now; the list does not grow if nets are added later.
    pub fn net_indices(&self) -> Vec<NetIndex> {
        self.iter_nets().collect()
    }

    pub fn device_indices(&self) -> Vec<DeviceIndex> {
        self.iter_devices().collect()
    }

    /// Generates a name that is not used by any net or device, in the form `{path}._L{n}`.
    pub fn local_symbol(&mut self, path: &str) -> String {
        loop {
            let name = format!("{path}._L{}", self.next_symbol);
            self.next_symbol += 1;
            if !self.nets.contains_key(&name) && !self.devices.contains_key(&name) {
                return name;
            }
        }
    }
}

impl Default for Design {
    fn default() -> Self {
        Design::new()
    }
}

impl Design {
    pub fn link_owner(&self, link: Link) -> LinkOwner {
        self.links[link.index()].owner
    }

    pub fn link_dir(&self, link: Link) -> LinkDir {
        self.links[link.index()].dir
    }

    pub fn next_link(&self, link: Link) -> Link {
        self.links[link.index()].next
    }

    /// Iterates over every other terminal joined to `link`, in ring order.
    pub fn ring(&self, link: Link) -> RingIter<'_> {
        RingIter { design: self, start: link, cursor: self.next_link(link) }
    }

    pub fn ring_len(&self, link: Link) -> usize {
        1 + self.ring(link).count()
    }

    pub fn is_linked(&self, link: Link, other: Link) -> bool {
        link == other || self.ring(link).any(|member| member == other)
    }

    /// Joins the rings of `link` and `other`. Traversal starting at `link` visits its own
    /// ring first, then the ring of `other` starting at `other`.
    pub fn connect(&mut self, link: Link, other: Link) {
        if self.is_linked(link, other) {
            return;
        }
        let link_prev = self.links[link.index()].prev;
        let other_prev = self.links[other.index()].prev;
        self.links[link_prev.index()].next = other;
        self.links[other.index()].prev = link_prev;
        self.links[other_prev.index()].next = link;
        self.links[link.index()].prev = other_prev;
    }

    /// Removes `link` from its ring, leaving the remaining terminals joined to each other.
    pub fn unlink(&mut self, link: Link) {
        let LinkData { next, prev, .. } = self.links[link.index()];
        self.links[prev.index()].next = next;
        self.links[next.index()].prev = prev;
        self.links[link.index()].next = link;
        self.links[link.index()].prev = link;
    }

    fn ring_members(&self, link: Link) -> impl Iterator<Item = Link> + '_ {
        std::iter::once(link).chain(self.ring(link))
    }

    /// Counts the terminals in the ring of `link` (itself included) that consume the signal.
    pub fn count_inputs(&self, link: Link) -> usize {
        self.ring_members(link).filter(|&member| self.link_dir(member) == LinkDir::Input).count()
    }

    /// Counts the terminals in the ring of `link` (itself included) that drive the signal.
    pub fn count_outputs(&self, link: Link) -> usize {
        self.ring_members(link).filter(|&member| self.link_dir(member) == LinkDir::Output).count()
    }

    /// Counts the terminals in the ring of `link` (itself included) that belong to a net.
    pub fn count_signals(&self, link: Link) -> usize {
        self.ring_members(link).filter(|&member| self.link_owner(member).as_net().is_some()).count()
    }

    pub fn ring_shape(&self, link: Link) -> RingShape {
        RingShape::new(self.count_inputs(link), self.count_outputs(link))
    }

    /// Returns one terminal of every ring with two or more terminals but no net on it.
    pub fn unnamed_rings(&self) -> Vec<Link> {
        (0..self.links.len())
            .map(Link::from_index)
            .filter(|&link| self.ring(link).all(|member| member > link))
            .filter(|&link| self.ring_len(link) > 1 && self.count_signals(link) == 0)
            .collect()
    }

    /// Counts devices by kind, and mapped devices under `XNF-LCA:<primitive>`.
    pub fn statistics(&self) -> BTreeMap<String, usize> {
        let mut result = BTreeMap::<String, usize>::new();
        for device in self.devices.values() {
            *result.entry(device.kind().to_string()).or_default() += 1;
            let lca = device.attribute(LCA_ATTRIBUTE);
            if !lca.is_empty() {
                *result.entry(format!("{LCA_ATTRIBUTE}:{lca}")).or_default() += 1;
            }
        }
        result
    }
}

pub struct RingIter<'a> {
    design: &'a Design,
    start: Link,
    cursor: Link,
}

impl Iterator for RingIter<'_> {
    type Item = Link;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.start {
            None
        } else {
            let link = self.cursor;
            self.cursor = self.design.next_link(link);
            Some(link)
        }
    }
}

/// A per-object callback interface for passes that visit the whole design.
pub trait Functor {
    type Error;

    fn signal(&mut self, design: &mut Design, net: NetIndex) -> Result<(), Self::Error> {
        let _ = (design, net);
        Ok(())
    }

    fn device(&mut self, design: &mut Design, device: DeviceIndex) -> Result<(), Self::Error> {
        let _ = (design, device);
        Ok(())
    }
}

impl Design {
    /// Calls the functor on every net and then every device that exists at the time of the call.
    /// Objects added by the functor itself are not visited.
    pub fn functor<F: Functor>(&mut self, functor: &mut F) -> Result<(), F::Error> {
        let nets = self.net_indices();
        let devices = self.device_indices();
        for net in nets {
            functor.signal(self, net)?;
        }
        for device in devices {
            functor.device(self, device)?;
        }
        Ok(())
    }
}
