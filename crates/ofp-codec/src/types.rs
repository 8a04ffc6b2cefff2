//! Core protocol types shared by both supported OpenFlow versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecError;

/// Sentinel buffer id meaning "no packet buffered on the switch".
pub const OFP_NO_BUFFER: u32 = 0xffff_ffff;

/// Negotiated OpenFlow protocol version of a switch connection.
///
/// Only the two versions this controller speaks are representable; the raw
/// wire byte is validated at the edge via [`ProtocolVersion::from_wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolVersion {
    /// OpenFlow 1.0 (wire version 0x01)
    OpenFlow10,
    /// OpenFlow 1.3 (wire version 0x04)
    OpenFlow13,
}

impl ProtocolVersion {
    /// Parses the version byte carried in the OpenFlow header.
    pub fn from_wire(version: u8) -> Result<Self, CodecError> {
        match version {
            0x01 => Ok(Self::OpenFlow10),
            0x04 => Ok(Self::OpenFlow13),
            other => Err(CodecError::UnsupportedVersion(other)),
        }
    }

    /// Returns the version byte used in message headers.
    pub fn wire(self) -> u8 {
        match self {
            Self::OpenFlow10 => 0x01,
            Self::OpenFlow13 => 0x04,
        }
    }

    /// Returns true if switches of this version drop unmatched frames by
    /// default and therefore need an explicit table-miss flow.
    pub fn needs_table_miss(self) -> bool {
        matches!(self, Self::OpenFlow13)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFlow10 => write!(f, "OF1.0"),
            Self::OpenFlow13 => write!(f, "OF1.3"),
        }
    }
}

/// Reserved logical output ports used by this controller.
///
/// The numeric encoding differs between protocol versions; [`Self::encode`]
/// is the only place those numbers live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalPort {
    /// Deliver the frame to the controller (OFPP_CONTROLLER).
    Controller,
    /// Send the frame out all eligible ports (OFPP_FLOOD).
    Flood,
}

impl LogicalPort {
    /// Returns the version-specific reserved port number.
    pub fn encode(self, version: ProtocolVersion) -> u32 {
        match (version, self) {
            (ProtocolVersion::OpenFlow10, Self::Flood) => 0xfffb,
            (ProtocolVersion::OpenFlow10, Self::Controller) => 0xfffd,
            (ProtocolVersion::OpenFlow13, Self::Flood) => 0xffff_fffb,
            (ProtocolVersion::OpenFlow13, Self::Controller) => 0xffff_fffd,
        }
    }
}

/// Reason field of a packet-in message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketInReason {
    /// No flow matched the frame (table-miss path).
    NoMatch,
    /// An installed flow explicitly sent the frame to the controller.
    Action,
    /// Frame had an invalid TTL (OF1.3 only).
    InvalidTtl,
}

impl PacketInReason {
    /// Parses the raw reason byte from the wire.
    pub fn from_wire(reason: u8) -> Result<Self, CodecError> {
        match reason {
            0 => Ok(Self::NoMatch),
            1 => Ok(Self::Action),
            2 => Ok(Self::InvalidTtl),
            other => Err(CodecError::UnknownReason(other)),
        }
    }
}

/// Flow table modification command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowModCommand {
    /// Add a new flow (OFPFC_ADD).
    Add,
}

impl FlowModCommand {
    pub fn wire(self) -> u8 {
        match self {
            Self::Add => 0,
        }
    }
}

/// A 48-bit IEEE 802 hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const ZERO: Self = Self([0; 6]);
    pub const BROADCAST: Self = Self([0xff; 6]);

    /// Returns true for group (multicast/broadcast) addresses.
    #[inline]
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in &mut bytes {
            let part = parts
                .next()
                .ok_or_else(|| CodecError::BadMacAddress(s.to_string()))?;
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| CodecError::BadMacAddress(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(CodecError::BadMacAddress(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Datapath identifier of a switch, as announced in its features reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatapathId(pub u64);

impl From<u64> for DatapathId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DatapathId {
    /// Renders the canonical colon-separated form, e.g.
    /// `00:00:00:00:00:00:00:01`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0.to_be_bytes();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]
        )
    }
}

impl Serialize for DatapathId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_round_trip() {
        assert_eq!(
            ProtocolVersion::from_wire(0x01).unwrap(),
            ProtocolVersion::OpenFlow10
        );
        assert_eq!(
            ProtocolVersion::from_wire(0x04).unwrap(),
            ProtocolVersion::OpenFlow13
        );
        assert_eq!(ProtocolVersion::OpenFlow10.wire(), 0x01);
        assert_eq!(ProtocolVersion::OpenFlow13.wire(), 0x04);
    }

    #[test]
    fn test_version_unsupported() {
        // 0x02/0x03 (OF1.1/1.2) are deliberately not spoken.
        for raw in [0x00, 0x02, 0x03, 0x05, 0xff] {
            assert!(matches!(
                ProtocolVersion::from_wire(raw),
                Err(CodecError::UnsupportedVersion(v)) if v == raw
            ));
        }
    }

    #[test]
    fn test_logical_port_encoding_per_version() {
        assert_eq!(
            LogicalPort::Flood.encode(ProtocolVersion::OpenFlow10),
            0xfffb
        );
        assert_eq!(
            LogicalPort::Controller.encode(ProtocolVersion::OpenFlow10),
            0xfffd
        );
        assert_eq!(
            LogicalPort::Flood.encode(ProtocolVersion::OpenFlow13),
            0xffff_fffb
        );
        assert_eq!(
            LogicalPort::Controller.encode(ProtocolVersion::OpenFlow13),
            0xffff_fffd
        );
    }

    #[test]
    fn test_table_miss_requirement() {
        assert!(!ProtocolVersion::OpenFlow10.needs_table_miss());
        assert!(ProtocolVersion::OpenFlow13.needs_table_miss());
    }

    #[test]
    fn test_packet_in_reason() {
        assert_eq!(PacketInReason::from_wire(0).unwrap(), PacketInReason::NoMatch);
        assert_eq!(PacketInReason::from_wire(1).unwrap(), PacketInReason::Action);
        assert!(matches!(
            PacketInReason::from_wire(7),
            Err(CodecError::UnknownReason(7))
        ));
    }

    #[test]
    fn test_mac_parse_display() {
        let mac: MacAddr = "01:80:c2:00:00:0e".parse().unwrap();
        assert_eq!(mac.0, [0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e]);
        assert_eq!(mac.to_string(), "01:80:c2:00:00:0e");

        assert!("01:80:c2:00:00".parse::<MacAddr>().is_err());
        assert!("01:80:c2:00:00:0e:11".parse::<MacAddr>().is_err());
        assert!("zz:80:c2:00:00:0e".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_classification() {
        assert!(MacAddr::BROADCAST.is_broadcast());
        assert!(MacAddr::BROADCAST.is_multicast());
        let lldp: MacAddr = "01:23:20:00:00:01".parse().unwrap();
        assert!(lldp.is_multicast());
        assert!(!lldp.is_broadcast());
        let unicast: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        assert!(!unicast.is_multicast());
    }

    #[test]
    fn test_dpid_display() {
        assert_eq!(
            DatapathId(1).to_string(),
            "00:00:00:00:00:00:00:01"
        );
        assert_eq!(
            DatapathId(0x0102_0304_0506_0708).to_string(),
            "01:02:03:04:05:06:07:08"
        );
    }
}
