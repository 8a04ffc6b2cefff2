//! Error types for l2lsd.

use ofp_codec::{CodecError, DatapathId};
use thiserror::Error;

/// Failure to hand a message to the outbound sink.
///
/// The sink contract is fail-fast: a saturated queue is reported, never
/// waited on, so one slow switch cannot stall the others.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The bounded outbound queue is full.
    #[error("outbound queue full")]
    Full,

    /// The receiving side of the sink has gone away.
    #[error("outbound queue closed")]
    Closed,
}

/// Failure answering a device-registry query.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// No state recorded for the device.
    #[error("unknown device {0}")]
    UnknownDevice(DatapathId),

    /// No admin state recorded for the port; callers treat this as
    /// forwarding-disabled.
    #[error("no admin state for port {port} on {dpid}")]
    UnknownPort { dpid: DatapathId, port: u32 },
}

/// Top-level daemon errors.
#[derive(Error, Debug)]
pub enum L2lsError {
    /// Frame or message codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Device registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Outbound sink error.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for l2lsd operations.
pub type Result<T> = std::result::Result<T, L2lsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(SinkError::Full.to_string(), "outbound queue full");

        let err = RegistryError::UnknownPort {
            dpid: DatapathId(1),
            port: 3,
        };
        assert_eq!(
            err.to_string(),
            "no admin state for port 3 on 00:00:00:00:00:00:00:01"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: L2lsError = SinkError::Closed.into();
        assert!(matches!(err, L2lsError::Sink(SinkError::Closed)));
    }
}
