//! Error types for the OpenFlow codec.

use thiserror::Error;

/// Errors raised while decoding frames or building wire messages.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The peer announced an OpenFlow version this controller does not speak.
    #[error("unsupported OpenFlow version 0x{0:02x}")]
    UnsupportedVersion(u8),

    /// A buffer ended before the structure being read did.
    #[error("truncated {what}: need {need} bytes, have {have}")]
    Truncated {
        what: &'static str,
        need: usize,
        have: usize,
    },

    /// A port number does not fit the OpenFlow 1.0 16-bit port field.
    #[error("port {0} does not fit the OpenFlow 1.0 port field")]
    PortOutOfRange(u32),

    /// Unrecognized packet-in reason byte.
    #[error("unknown packet-in reason {0}")]
    UnknownReason(u8),

    /// An OXM entry with a class/field combination we do not handle.
    #[error("unsupported OXM entry (class 0x{class:04x}, field {field})")]
    UnsupportedOxm { class: u16, field: u8 },

    /// A match structure violated the layout rules of its version.
    #[error("bad match structure: {0}")]
    BadMatch(&'static str),

    /// A hardware address string could not be parsed.
    #[error("bad MAC address: {0}")]
    BadMacAddress(String),
}
