use std::collections::BTreeMap;
use std::fmt::Display;

use crate::{Design, Link, LinkOwner};

impl Design {
    pub(crate) fn write_string(&self, f: &mut std::fmt::Formatter, str: &str) -> std::fmt::Result {
        write!(f, "\"")?;
        for byte in str.as_bytes() {
            if (byte.is_ascii_graphic() || matches!(byte, b' ' | b'\t')) && !matches!(byte, b'"' | b'\\') {
                write!(f, "{}", *byte as char)?;
            } else {
                write!(f, "\\{:02x}", byte)?;
            }
        }
        write!(f, "\"")?;
        Ok(())
    }

    fn write_attributes(&self, f: &mut std::fmt::Formatter, attributes: &BTreeMap<String, String>) -> std::fmt::Result {
        if attributes.is_empty() {
            return Ok(());
        }
        write!(f, " {{")?;
        for (name, value) in attributes {
            write!(f, " ")?;
            self.write_string(f, name)?;
            write!(f, "=")?;
            self.write_string(f, value)?;
        }
        write!(f, " }}")
    }

    pub(crate) fn write_link(&self, f: &mut std::fmt::Formatter, link: Link) -> std::fmt::Result {
        match self.link_owner(link) {
            LinkOwner::Net(net, pin) => {
                write!(f, "&")?;
                self.write_string(f, self.net_name(net))?;
                write!(f, "+{pin}")
            }
            LinkOwner::Device(device, pin) => {
                write!(f, "%")?;
                self.write_string(f, self.device_name(device))?;
                write!(f, "+{pin}")
            }
        }
    }

    // Each ring is printed once, starting from its smallest `LinkOwner`: nets before devices,
    // then by index and pin. The output does not depend on the order links were allocated in.
    fn ring_heads(&self) -> Vec<Link> {
        let mut heads = Vec::new();
        let mut links = Vec::new();
        for net in self.iter_nets() {
            links.extend((0..self.net(net).pin_count()).map(|pin| self.net_pin(net, pin)));
        }
        for device in self.iter_devices() {
            links.extend((0..self.device(device).pin_count()).map(|pin| self.device_pin(device, pin)));
        }
        for link in links {
            let owner = self.link_owner(link);
            if self.next_link(link) != link && self.ring(link).all(|member| self.link_owner(member) > owner) {
                heads.push(link);
            }
        }
        heads
    }
}

impl Display for Design {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for net_index in self.iter_nets() {
            let net = self.net(net_index);
            write!(f, "&")?;
            self.write_string(f, self.net_name(net_index))?;
            write!(f, ":{} {}", net.pin_count(), net.kind())?;
            self.write_attributes(f, net.attributes())?;
            writeln!(f)?;
        }
        for device_index in self.iter_devices() {
            let device = self.device(device_index);
            write!(f, "%")?;
            self.write_string(f, self.device_name(device_index))?;
            write!(f, ":{} {}", device.pin_count(), device.kind())?;
            self.write_attributes(f, device.attributes())?;
            writeln!(f)?;
        }
        for head in self.ring_heads() {
            write!(f, "ring ")?;
            self.write_link(f, head)?;
            for member in self.ring(head) {
                write!(f, " ")?;
                self.write_link(f, member)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
