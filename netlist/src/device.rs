use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::{Link, LinkDir};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceIndex(pub(crate) usize);

impl DeviceIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Gate function of a logic device. Terminal 0 is the output, the rest are inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicKind {
    And,
    Buf,
    Bufif0,
    Bufif1,
    Nand,
    Nor,
    Not,
    Or,
    Xnor,
    Xor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceKind {
    Logic(LogicKind),
    /// Terminals are Q, D, CLK.
    Dff,
    Const(bool),
}

impl DeviceKind {
    pub fn is_valid_pin_count(self, pin_count: usize) -> bool {
        match self {
            DeviceKind::Logic(LogicKind::Bufif0 | LogicKind::Bufif1) => pin_count == 3,
            DeviceKind::Logic(_) => pin_count >= 2,
            DeviceKind::Dff => pin_count == 3,
            DeviceKind::Const(_) => pin_count == 1,
        }
    }

    pub fn pin_dir(self, pin: usize) -> LinkDir {
        match (self, pin) {
            (_, 0) => LinkDir::Output,
            (DeviceKind::Logic(_) | DeviceKind::Dff, _) => LinkDir::Input,
            (DeviceKind::Const(_), _) => unreachable!(),
        }
    }
}

impl Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            DeviceKind::Logic(LogicKind::And) => "and",
            DeviceKind::Logic(LogicKind::Buf) => "buf",
            DeviceKind::Logic(LogicKind::Bufif0) => "bufif0",
            DeviceKind::Logic(LogicKind::Bufif1) => "bufif1",
            DeviceKind::Logic(LogicKind::Nand) => "nand",
            DeviceKind::Logic(LogicKind::Nor) => "nor",
            DeviceKind::Logic(LogicKind::Not) => "not",
            DeviceKind::Logic(LogicKind::Or) => "or",
            DeviceKind::Logic(LogicKind::Xnor) => "xnor",
            DeviceKind::Logic(LogicKind::Xor) => "xor",
            DeviceKind::Dff => "dff",
            DeviceKind::Const(false) => "const0",
            DeviceKind::Const(true) => "const1",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DeviceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "and" => DeviceKind::Logic(LogicKind::And),
            "buf" => DeviceKind::Logic(LogicKind::Buf),
            "bufif0" => DeviceKind::Logic(LogicKind::Bufif0),
            "bufif1" => DeviceKind::Logic(LogicKind::Bufif1),
            "nand" => DeviceKind::Logic(LogicKind::Nand),
            "nor" => DeviceKind::Logic(LogicKind::Nor),
            "not" => DeviceKind::Logic(LogicKind::Not),
            "or" => DeviceKind::Logic(LogicKind::Or),
            "xnor" => DeviceKind::Logic(LogicKind::Xnor),
            "xor" => DeviceKind::Logic(LogicKind::Xor),
            "dff" => DeviceKind::Dff,
            "const0" => DeviceKind::Const(false),
            "const1" => DeviceKind::Const(true),
            _ => return Err(()),
        })
    }
}

/// Device attribute naming the XNF primitive a device has been mapped to.
pub const LCA_ATTRIBUTE: &str = "XNF-LCA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    kind: DeviceKind,
    first_pin: Link,
    pin_count: usize,
    attributes: BTreeMap<String, String>,
}

impl Device {
    pub(crate) fn new(kind: DeviceKind, first_pin: Link, pin_count: usize) -> Device {
        Device { kind, first_pin, pin_count, attributes: BTreeMap::new() }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn pin_count(&self) -> usize {
        self.pin_count
    }

    pub fn pin(&self, index: usize) -> Link {
        assert!(index < self.pin_count, "pin {index} out of range for device with {} pins", self.pin_count);
        self.first_pin.offset(index)
    }

    /// Checks whether this is a single-input gate of the given function, i.e. something that
    /// passes one signal from terminal 1 to terminal 0.
    pub fn is_simple(&self, kind: LogicKind) -> bool {
        self.kind == DeviceKind::Logic(kind) && self.pin_count == 2
    }

    pub fn attribute(&self, name: &str) -> &str {
        self.attributes.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }
}
