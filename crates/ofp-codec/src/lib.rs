//! OpenFlow wire codec for the of-l2ls controller.
//!
//! This crate owns everything that depends on the on-wire shape of the two
//! supported protocol versions:
//!
//! - [`ProtocolVersion`], [`LogicalPort`] and the other shared protocol types
//! - [`EthernetFrame`] decoding for packet-in payloads
//! - the version-specific message structures ([`of10`], [`of13`]) and their
//!   big-endian codecs
//! - the [`builder`] functions translating semantic intent into a finished,
//!   version-tagged [`Message`]
//!
//! Everything here is pure computation; the daemon crate decides when to
//! build and where to send.

mod error;
mod frame;
mod types;
mod wire;

pub mod builder;
pub mod of10;
pub mod of13;

pub use builder::{ForwardingRule, ImmediateAction, Message};
pub use error::CodecError;
pub use frame::{EthernetFrame, ETHERNET_HEADER_LEN};
pub use types::{
    DatapathId, FlowModCommand, LogicalPort, MacAddr, PacketInReason, ProtocolVersion,
    OFP_NO_BUFFER,
};
