//! OpenFlow 1.0 (wire version 0x01) message structures.
//!
//! The 1.0 match is a fixed 40-byte block of scalar fields gated by a
//! wildcard bitmap; actions are a bare list appended to the message.

use serde::Serialize;

use crate::error::CodecError;
use crate::types::{FlowModCommand, MacAddr, OFP_NO_BUFFER};
use crate::wire::{self, Reader};

pub const OFPT_PACKET_OUT: u8 = 13;
pub const OFPT_FLOW_MOD: u8 = 14;

/// "Not associated with a physical port" (flow-mod `out_port` filter).
pub const OFPP_NONE: u16 = 0xffff;

/// Cap for controller-bound output actions: send the entire frame.
pub const MAX_LEN_SEND_ALL: u16 = 0xffff;

const WIRE_VERSION: u8 = 0x01;
const HEADER_LEN: usize = 8;
const ACTION_OUTPUT_LEN: usize = 8;

/// Byte size of the 1.0 match structure.
pub const MATCH_LEN: usize = 40;

const OFPFW_ALL: u32 = (1 << 22) - 1;
const OFPFW_DL_SRC: u32 = 1 << 2;
const OFPFW_DL_DST: u32 = 1 << 3;
const OFPFW_DL_TYPE: u32 = 1 << 4;

const OFPAT_OUTPUT: u16 = 0;

/// OpenFlow 1.0 flow match.
///
/// Fields not covered by this controller stay zero and wildcarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub wildcards: u32,
    pub in_port: u16,
    pub dl_src: MacAddr,
    pub dl_dst: MacAddr,
    pub dl_vlan: u16,
    pub dl_vlan_pcp: u8,
    pub dl_type: u16,
    pub nw_tos: u8,
    pub nw_proto: u8,
    pub nw_src: u32,
    pub nw_dst: u32,
    pub tp_src: u16,
    pub tp_dst: u16,
}

impl Default for Match {
    fn default() -> Self {
        Self {
            wildcards: OFPFW_ALL,
            in_port: 0,
            dl_src: MacAddr::ZERO,
            dl_dst: MacAddr::ZERO,
            dl_vlan: 0,
            dl_vlan_pcp: 0,
            dl_type: 0,
            nw_tos: 0,
            nw_proto: 0,
            nw_src: 0,
            nw_dst: 0,
            tp_src: 0,
            tp_dst: 0,
        }
    }
}

impl Match {
    /// Match on exactly the link-layer triple; everything else wildcarded.
    pub fn link_exact(dl_src: MacAddr, dl_dst: MacAddr, dl_type: u16) -> Self {
        Self {
            wildcards: OFPFW_ALL & !(OFPFW_DL_SRC | OFPFW_DL_DST | OFPFW_DL_TYPE),
            dl_src,
            dl_dst,
            dl_type,
            ..Default::default()
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        wire::put_u32(buf, self.wildcards);
        wire::put_u16(buf, self.in_port);
        buf.extend_from_slice(&self.dl_src.0);
        buf.extend_from_slice(&self.dl_dst.0);
        wire::put_u16(buf, self.dl_vlan);
        wire::put_u8(buf, self.dl_vlan_pcp);
        wire::pad(buf, 1);
        wire::put_u16(buf, self.dl_type);
        wire::put_u8(buf, self.nw_tos);
        wire::put_u8(buf, self.nw_proto);
        wire::pad(buf, 2);
        wire::put_u32(buf, self.nw_src);
        wire::put_u32(buf, self.nw_dst);
        wire::put_u16(buf, self.tp_src);
        wire::put_u16(buf, self.tp_dst);
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(data, "of1.0 match");
        let wildcards = r.u32()?;
        let in_port = r.u16()?;
        let dl_src = MacAddr(r.mac()?);
        let dl_dst = MacAddr(r.mac()?);
        let dl_vlan = r.u16()?;
        let dl_vlan_pcp = r.u8()?;
        r.skip(1)?;
        let dl_type = r.u16()?;
        let nw_tos = r.u8()?;
        let nw_proto = r.u8()?;
        r.skip(2)?;
        let nw_src = r.u32()?;
        let nw_dst = r.u32()?;
        let tp_src = r.u16()?;
        let tp_dst = r.u16()?;
        Ok(Self {
            wildcards,
            in_port,
            dl_src,
            dl_dst,
            dl_vlan,
            dl_vlan_pcp,
            dl_type,
            nw_tos,
            nw_proto,
            nw_src,
            nw_dst,
            tp_src,
            tp_dst,
        })
    }
}

/// Single output action (OFPAT_OUTPUT), 8 bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionOutput {
    pub port: u16,
    pub max_len: u16,
}

impl ActionOutput {
    pub fn new(port: u16) -> Self {
        Self { port, max_len: 0 }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        wire::put_u16(buf, OFPAT_OUTPUT);
        wire::put_u16(buf, ACTION_OUTPUT_LEN as u16);
        wire::put_u16(buf, self.port);
        wire::put_u16(buf, self.max_len);
    }
}

/// OFPT_FLOW_MOD message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowMod {
    #[serde(skip)]
    pub xid: u32,
    pub flow_match: Match,
    pub cookie: u64,
    pub command: FlowModCommand,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
    pub buffer_id: u32,
    pub out_port: u16,
    pub flags: u16,
    pub actions: Vec<ActionOutput>,
}

impl Default for FlowMod {
    fn default() -> Self {
        Self {
            xid: 0,
            flow_match: Match::default(),
            cookie: 0,
            command: FlowModCommand::Add,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: 0,
            buffer_id: OFP_NO_BUFFER,
            out_port: OFPP_NONE,
            flags: 0,
            actions: Vec::new(),
        }
    }
}

impl FlowMod {
    pub fn encode(&self) -> Vec<u8> {
        let length = HEADER_LEN + MATCH_LEN + 24 + self.actions.len() * ACTION_OUTPUT_LEN;
        let mut buf = wire::header(WIRE_VERSION, OFPT_FLOW_MOD, length as u16, self.xid);
        self.flow_match.encode(&mut buf);
        wire::put_u64(&mut buf, self.cookie);
        wire::put_u16(&mut buf, self.command.wire() as u16);
        wire::put_u16(&mut buf, self.idle_timeout);
        wire::put_u16(&mut buf, self.hard_timeout);
        wire::put_u16(&mut buf, self.priority);
        wire::put_u32(&mut buf, self.buffer_id);
        wire::put_u16(&mut buf, self.out_port);
        wire::put_u16(&mut buf, self.flags);
        for action in &self.actions {
            action.encode(&mut buf);
        }
        buf
    }
}

/// OFPT_PACKET_OUT message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketOut {
    #[serde(skip)]
    pub xid: u32,
    pub buffer_id: u32,
    pub in_port: u16,
    pub actions: Vec<ActionOutput>,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl PacketOut {
    pub fn encode(&self) -> Vec<u8> {
        let actions_len = self.actions.len() * ACTION_OUTPUT_LEN;
        let length = HEADER_LEN + 8 + actions_len + self.data.len();
        let mut buf = wire::header(WIRE_VERSION, OFPT_PACKET_OUT, length as u16, self.xid);
        wire::put_u32(&mut buf, self.buffer_id);
        wire::put_u16(&mut buf, self.in_port);
        wire::put_u16(&mut buf, actions_len as u16);
        for action in &self.actions {
            action.encode(&mut buf);
        }
        buf.extend_from_slice(&self.data);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mac(b: u8) -> MacAddr {
        MacAddr([b; 6])
    }

    #[test]
    fn test_match_wildcards() {
        let m = Match::default();
        assert_eq!(m.wildcards, 0x003f_ffff);

        let m = Match::link_exact(mac(0xaa), mac(0xbb), 0x0800);
        // src, dst and type bits cleared
        assert_eq!(m.wildcards, 0x003f_ffff & !0x1c);
    }

    #[test]
    fn test_match_encoded_size() {
        let mut buf = Vec::new();
        Match::link_exact(mac(0xaa), mac(0xbb), 0x0800).encode(&mut buf);
        assert_eq!(buf.len(), MATCH_LEN);
    }

    #[test]
    fn test_match_round_trip() {
        let m = Match::link_exact(mac(0xaa), mac(0xbb), 0x0800);
        let mut buf = Vec::new();
        m.encode(&mut buf);
        let decoded = Match::decode(&buf).unwrap();
        assert_eq!(decoded, m);
        assert_eq!(decoded.dl_src, mac(0xaa));
        assert_eq!(decoded.dl_dst, mac(0xbb));
        assert_eq!(decoded.dl_type, 0x0800);
    }

    #[test]
    fn test_match_decode_truncated() {
        assert!(Match::decode(&[0u8; 39]).is_err());
    }

    #[test]
    fn test_flow_mod_wire_layout() {
        let flow_mod = FlowMod {
            flow_match: Match::link_exact(mac(0xaa), mac(0xbb), 0x0800),
            priority: 10,
            actions: vec![ActionOutput::new(3)],
            ..Default::default()
        };
        let buf = flow_mod.encode();

        assert_eq!(buf.len(), 80);
        assert_eq!(buf[0], 0x01);
        assert_eq!(buf[1], OFPT_FLOW_MOD);
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), 80);
        // command = OFPFC_ADD right after the 40-byte match and cookie
        let cmd_at = 8 + MATCH_LEN + 8;
        assert_eq!(u16::from_be_bytes([buf[cmd_at], buf[cmd_at + 1]]), 0);
        // priority two fields later
        let prio_at = cmd_at + 2 + 2 + 2;
        assert_eq!(u16::from_be_bytes([buf[prio_at], buf[prio_at + 1]]), 10);
        // trailing action: type 0, len 8, port 3, max_len 0
        let action = &buf[72..];
        assert_eq!(action, &[0, 0, 0, 8, 0, 3, 0, 0]);
    }

    #[test]
    fn test_packet_out_wire_layout() {
        let packet_out = PacketOut {
            xid: 0,
            buffer_id: 42,
            in_port: 1,
            actions: vec![ActionOutput::new(0xfffb)],
            data: vec![0xde, 0xad],
        };
        let buf = packet_out.encode();

        assert_eq!(buf.len(), 8 + 8 + 8 + 2);
        assert_eq!(buf[1], OFPT_PACKET_OUT);
        assert_eq!(u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]), 42);
        assert_eq!(u16::from_be_bytes([buf[12], buf[13]]), 1);
        // actions_len covers the single 8-byte action
        assert_eq!(u16::from_be_bytes([buf[14], buf[15]]), 8);
        assert_eq!(&buf[buf.len() - 2..], &[0xde, 0xad]);
    }
}
