use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::Link;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetIndex(pub(crate) usize);

impl NetIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetKind {
    Implicit,
    Wire,
    Reg,
}

impl Display for NetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            NetKind::Implicit => write!(f, "implicit"),
            NetKind::Wire => write!(f, "wire"),
            NetKind::Reg => write!(f, "reg"),
        }
    }
}

impl FromStr for NetKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "implicit" => Ok(NetKind::Implicit),
            "wire" => Ok(NetKind::Wire),
            "reg" => Ok(NetKind::Reg),
            _ => Err(()),
        }
    }
}

/// A named conductor. Every terminal of a net is passive; direction comes from the devices
/// sharing its rings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Net {
    kind: NetKind,
    first_pin: Link,
    pin_count: usize,
    attributes: BTreeMap<String, String>,
}

impl Net {
    pub(crate) fn new(kind: NetKind, first_pin: Link, pin_count: usize) -> Net {
        Net { kind, first_pin, pin_count, attributes: BTreeMap::new() }
    }

    pub fn kind(&self) -> NetKind {
        self.kind
    }

    pub fn pin_count(&self) -> usize {
        self.pin_count
    }

    pub fn pin(&self, index: usize) -> Link {
        assert!(index < self.pin_count, "pin {index} out of range for net with {} pins", self.pin_count);
        self.first_pin.offset(index)
    }

    /// Returns the attribute value, or an empty string if the attribute is not set.
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
