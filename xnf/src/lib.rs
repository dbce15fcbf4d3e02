//! Technology mapping passes for the Xilinx XNF netlist format.

mod xnfio;

pub use xnfio::{
    classify, find_ibuf, find_obuf, insert_buffer, xnfio, xnfio_with, OnError, PadKind, TaggedDevices, XnfioError,
    XnfioOptions, IBUF, LCA_ATTRIBUTE, OBUF, OBUF_INVERTED, PAD_ATTRIBUTE,
};
