use std::error::Error;
use std::fmt::Display;

use log::{debug, trace, warn};
use xnl_netlist::{Design, Device, DeviceIndex, DeviceKind, Functor, Link, LinkOwner, LogicKind, NetIndex, NetKind, RingShape};

pub use xnl_netlist::LCA_ATTRIBUTE;

pub const PAD_ATTRIBUTE: &str = "PAD";

pub const OBUF: &str = "OBUF:O,I";
pub const OBUF_INVERTED: &str = "OBUF:O,~I";
pub const IBUF: &str = "IBUF:O,I";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PadKind {
    NotAPad,
    Input,
    Output,
}

/// Whether a device that already carries an `XNF-LCA` mapping may be picked up again as a pad buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TaggedDevices {
    #[default]
    Retag,
    Skip,
}

impl TaggedDevices {
    fn is_eligible(self, device: &Device) -> bool {
        match self {
            TaggedDevices::Retag => true,
            TaggedDevices::Skip => device.attribute(LCA_ATTRIBUTE).is_empty(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OnError {
    /// Stop at the first pad that cannot be handled.
    #[default]
    Abort,
    /// Leave the offending net alone and carry on; the first error is still reported at the end.
    SkipNet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct XnfioOptions {
    pub tagged_devices: TaggedDevices,
    pub on_error: OnError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XnfioError {
    InvariantViolation { net: String, reason: String },
    Unsupported { net: String, value: String },
}

impl XnfioError {
    fn invariant(design: &Design, net: NetIndex, reason: impl Into<String>) -> XnfioError {
        XnfioError::InvariantViolation { net: design.net_name(net).to_owned(), reason: reason.into() }
    }
}

impl Display for XnfioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XnfioError::InvariantViolation { net, reason } => write!(f, "pad net {net:?}: {reason}"),
            // only IPAD and OPAD exist so far
            XnfioError::Unsupported { net, value } => write!(f, "pad net {net:?}: unsupported pad kind {value:?}"),
        }
    }
}

impl Error for XnfioError {}

pub fn classify(design: &Design, net_index: NetIndex) -> Result<PadKind, XnfioError> {
    let net = design.net(net_index);
    let pad = net.attribute(PAD_ATTRIBUTE);
    let Some(direction) = pad.chars().next() else {
        return Ok(PadKind::NotAPad);
    };
    if net.pin_count() != 1 {
        return Err(XnfioError::invariant(design, net_index, format!("expected 1 pin, found {}", net.pin_count())));
    }
    match direction {
        'i' | 'I' => Ok(PadKind::Input),
        'o' | 'O' => Ok(PadKind::Output),
        _ => Err(XnfioError::Unsupported { net: design.net_name(net_index).to_owned(), value: pad.to_owned() }),
    }
}

fn ring_devices<'a>(design: &'a Design, pin: Link) -> impl Iterator<Item = DeviceIndex> + 'a {
    design.ring(pin).filter_map(|link| match design.link_owner(link) {
        LinkOwner::Device(device, _) => Some(device),
        LinkOwner::Net(..) => None,
    })
}

/// Looks for a gate on the pad ring whose output drives nothing but the pad, so that it can be
/// moved into the IOB as the output buffer. An inverter is also usable since the OBUF input
/// can be inverted.
pub fn find_obuf(design: &Design, pin: Link, tagged_devices: TaggedDevices) -> Option<(DeviceIndex, &'static str)> {
    for device_index in ring_devices(design, pin) {
        let device = design.device(device_index);
        trace!("considering {} {:?} as OBUF", device.kind(), design.device_name(device_index));
        if !tagged_devices.is_eligible(device) {
            continue;
        }
        let output_shape = design.ring_shape(device.pin(0));
        if device.is_simple(LogicKind::Buf) && output_shape == RingShape::new(0, 1) {
            return Some((device_index, OBUF));
        }
        if device.is_simple(LogicKind::Not) && output_shape == RingShape::new(0, 1) {
            return Some((device_index, OBUF_INVERTED));
        }
    }
    None
}

/// Looks for a buffer on the pad ring whose input is fed by the pad alone.
pub fn find_ibuf(design: &Design, pin: Link, tagged_devices: TaggedDevices) -> Option<(DeviceIndex, &'static str)> {
    for device_index in ring_devices(design, pin) {
        let device = design.device(device_index);
        trace!("considering {} {:?} as IBUF", device.kind(), design.device_name(device_index));
        if !tagged_devices.is_eligible(device) {
            continue;
        }
        if device.is_simple(LogicKind::Buf) && design.ring_shape(device.pin(1)) == RingShape::new(1, 0) {
            return Some((device_index, IBUF));
        }
    }
    None
}

/// Splices a new buffer between the pad terminal and the rest of its ring. The buffer terminal
/// `pad_side` ends up joined to the pad only; the other one takes over the old ring.
pub fn insert_buffer(design: &mut Design, pad_pin: Link, pad_side: usize, lca: &str) -> DeviceIndex {
    assert!(pad_side < 2);
    let name = design.local_symbol("$");
    let buffer = design.add_device(name, DeviceKind::Logic(LogicKind::Buf), 2);
    design.device_mut(buffer).set_attribute(LCA_ATTRIBUTE, lca);

    let buffer_pad = design.device_pin(buffer, pad_side);
    let buffer_far = design.device_pin(buffer, 1 - pad_side);
    design.connect(pad_pin, buffer_far);
    design.unlink(pad_pin);
    design.connect(pad_pin, buffer_pad);

    // With the pad gone, the far ring may be left with no net at all.
    if design.count_signals(buffer_far) == 0 {
        let name = design.local_symbol("$");
        let wire = design.add_net(name, NetKind::Wire, 1);
        design.connect(buffer_far, design.net_pin(wire, 0));
        debug!("added net {:?} to keep the ring of {:?} named", design.net_name(wire), design.device_name(buffer));
    }
    buffer
}

fn tag_device(design: &mut Design, net: NetIndex, device: DeviceIndex, lca: &str) {
    debug!(
        "pad {:?}: using existing {} {:?} as {lca}",
        design.net_name(net),
        design.device(device).kind(),
        design.device_name(device)
    );
    design.device_mut(device).set_attribute(LCA_ATTRIBUTE, lca);
}

fn make_obuf(design: &mut Design, net: NetIndex, options: &XnfioOptions) -> Result<(), XnfioError> {
    let pin = design.net_pin(net, 0);
    // TODO: an undriven output pad could be tied to a pullup and cut off from the rest of the circuit.
    if design.count_outputs(pin) == 0 {
        return Err(XnfioError::invariant(design, net, "output pad is not driven"));
    }
    if let Some((device, lca)) = find_obuf(design, pin, options.tagged_devices) {
        tag_device(design, net, device, lca);
        return Ok(());
    }
    let buffer = insert_buffer(design, pin, 0, OBUF);
    debug!("pad {:?}: inserted {OBUF} {:?}", design.net_name(net), design.device_name(buffer));
    Ok(())
}

fn make_ibuf(design: &mut Design, net: NetIndex, options: &XnfioOptions) -> Result<(), XnfioError> {
    let pin = design.net_pin(net, 0);
    if design.count_inputs(pin) == 0 {
        return Err(XnfioError::invariant(design, net, "input pad is not used"));
    }
    if let Some((device, lca)) = find_ibuf(design, pin, options.tagged_devices) {
        tag_device(design, net, device, lca);
        return Ok(());
    }
    let buffer = insert_buffer(design, pin, 1, IBUF);
    debug!("pad {:?}: inserted {IBUF} {:?}", design.net_name(net), design.device_name(buffer));
    Ok(())
}

struct Xnfio {
    options: XnfioOptions,
    first_error: Option<XnfioError>,
}

impl Xnfio {
    fn process(&self, design: &mut Design, net: NetIndex) -> Result<(), XnfioError> {
        match classify(design, net)? {
            PadKind::NotAPad => Ok(()),
            PadKind::Input => make_ibuf(design, net, &self.options),
            PadKind::Output => make_obuf(design, net, &self.options),
        }
    }
}

impl Functor for Xnfio {
    type Error = XnfioError;

    fn signal(&mut self, design: &mut Design, net: NetIndex) -> Result<(), XnfioError> {
        match self.process(design, net) {
            Ok(()) => Ok(()),
            Err(error) => match self.options.on_error {
                OnError::Abort => Err(error),
                OnError::SkipNet => {
                    warn!("{error}; net left unbuffered");
                    self.first_error.get_or_insert(error);
                    Ok(())
                }
            },
        }
    }
}

/// Makes sure every net carrying a `PAD` attribute is separated from the rest of the design by
/// a buffer tagged with the IOB primitive it maps to.
pub fn xnfio(design: &mut Design) -> Result<(), XnfioError> {
    xnfio_with(design, XnfioOptions::default())
}

pub fn xnfio_with(design: &mut Design, options: XnfioOptions) -> Result<(), XnfioError> {
    let mut functor = Xnfio { options, first_error: None };
    design.functor(&mut functor)?;
    match functor.first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
