//! Events consumed from the switch connection layer.
//!
//! The connection layer owns the sockets and the OpenFlow handshake; what
//! reaches this daemon is the already-framed event stream. The protocol
//! version announced at handshake time is attached to every event as the raw
//! wire byte and validated where it is used.

use ofp_codec::DatapathId;

/// A packet-in notification: a frame reached the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketInEvent {
    pub dpid: DatapathId,
    /// Raw OpenFlow version byte announced by the device.
    pub version: u8,
    /// Raw packet-in reason byte.
    pub reason: u8,
    /// Ingress port the frame arrived on.
    pub in_port: u32,
    /// Device-side buffer holding the frame, or `OFP_NO_BUFFER`.
    pub buffer_id: u32,
    /// Raw frame bytes.
    pub data: Vec<u8>,
}

/// Events delivered to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// A switch completed its handshake.
    Connected { dpid: DatapathId, version: u8 },
    /// A frame was delivered to the controller.
    PacketIn(PacketInEvent),
}

impl SwitchEvent {
    /// Device the event concerns, for log context.
    pub fn dpid(&self) -> DatapathId {
        match self {
            Self::Connected { dpid, .. } => *dpid,
            Self::PacketIn(event) => event.dpid,
        }
    }
}
