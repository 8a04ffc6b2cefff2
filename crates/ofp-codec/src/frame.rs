//! Ethernet frame decoding.
//!
//! Packet-in events carry the raw frame bytes; the handler only needs the
//! link-layer header to learn the source and resolve the destination, so the
//! payload is kept as a borrowed slice.

use crate::error::CodecError;
use crate::types::MacAddr;

/// Destination(6) + source(6) + ethertype(2).
pub const ETHERNET_HEADER_LEN: usize = 14;

/// 802.1Q tag protocol identifier.
const ETHERTYPE_VLAN: u16 = 0x8100;

/// Decoded view of a received frame. Borrows the event buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetFrame<'a> {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ether_type: u16,
    pub payload: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    /// Decodes the link-layer header from raw frame bytes.
    ///
    /// A single 802.1Q tag is skipped so `ether_type` reports the
    /// encapsulated protocol; the tag itself is not interpreted further.
    pub fn decode(data: &'a [u8]) -> Result<Self, CodecError> {
        if data.len() < ETHERNET_HEADER_LEN {
            return Err(CodecError::Truncated {
                what: "ethernet frame",
                need: ETHERNET_HEADER_LEN,
                have: data.len(),
            });
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&data[0..6]);
        src.copy_from_slice(&data[6..12]);

        let mut ether_type = u16::from_be_bytes([data[12], data[13]]);
        let mut offset = ETHERNET_HEADER_LEN;

        if ether_type == ETHERTYPE_VLAN {
            if data.len() < ETHERNET_HEADER_LEN + 4 {
                return Err(CodecError::Truncated {
                    what: "802.1q header",
                    need: ETHERNET_HEADER_LEN + 4,
                    have: data.len(),
                });
            }
            ether_type = u16::from_be_bytes([data[16], data[17]]);
            offset += 4;
        }

        Ok(Self {
            destination: MacAddr(dst),
            source: MacAddr(src),
            ether_type,
            payload: &data[offset..],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame_bytes(dst: [u8; 6], src: [u8; 6], ethertype: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&dst);
        out.extend_from_slice(&src);
        out.extend_from_slice(&ethertype.to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_decode_basic() {
        let data = frame_bytes(
            [0xaa; 6],
            [0xbb; 6],
            0x0800,
            &[0x45, 0x00, 0x00, 0x1c],
        );
        let frame = EthernetFrame::decode(&data).unwrap();
        assert_eq!(frame.destination, MacAddr([0xaa; 6]));
        assert_eq!(frame.source, MacAddr([0xbb; 6]));
        assert_eq!(frame.ether_type, 0x0800);
        assert_eq!(frame.payload, &[0x45, 0x00, 0x00, 0x1c]);
    }

    #[test]
    fn test_decode_truncated() {
        let err = EthernetFrame::decode(&[0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated { need: 14, have: 10, .. }
        ));
    }

    #[test]
    fn test_decode_vlan_tagged() {
        let mut data = frame_bytes([0xaa; 6], [0xbb; 6], 0x8100, &[]);
        // tag control (vlan 100) followed by the real ethertype
        data.extend_from_slice(&[0x00, 0x64]);
        data.extend_from_slice(&0x0806u16.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x01]);

        let frame = EthernetFrame::decode(&data).unwrap();
        assert_eq!(frame.ether_type, 0x0806);
        assert_eq!(frame.payload, &[0x00, 0x01]);
    }

    #[test]
    fn test_decode_vlan_truncated() {
        let data = frame_bytes([0xaa; 6], [0xbb; 6], 0x8100, &[]);
        assert!(EthernetFrame::decode(&data).is_err());
    }
}
