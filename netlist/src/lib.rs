mod net;
mod device;
mod link;
mod design;
mod print;
mod parse;

pub use net::{Net, NetIndex, NetKind};
pub use device::{Device, DeviceIndex, DeviceKind, LogicKind, LCA_ATTRIBUTE};
pub use link::{Link, LinkDir, LinkOwner, RingShape};
pub use design::{Design, Functor, RingIter};
pub use parse::{parse, ParseError};
