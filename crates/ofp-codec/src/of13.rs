//! OpenFlow 1.3 (wire version 0x04) message structures.
//!
//! Match criteria are OXM type-length-value entries and flow actions are
//! carried inside instructions rather than as a bare list.

use serde::Serialize;

use crate::error::CodecError;
use crate::types::{FlowModCommand, MacAddr, OFP_NO_BUFFER};
use crate::wire::{self, Reader};

pub const OFPT_PACKET_OUT: u8 = 13;
pub const OFPT_FLOW_MOD: u8 = 14;

/// Wildcard for the flow-mod `out_port` / `out_group` filters.
pub const OFPP_ANY: u32 = 0xffff_ffff;
pub const OFPG_ANY: u32 = 0xffff_ffff;

/// `max_len` value requesting the full frame without buffering.
pub const OFPCML_NO_BUFFER: u16 = 0xffff;

const WIRE_VERSION: u8 = 0x04;
const HEADER_LEN: usize = 8;
const ACTION_OUTPUT_LEN: usize = 16;

const OFPMT_OXM: u16 = 1;
const OFPXMC_OPENFLOW_BASIC: u16 = 0x8000;
const OFPIT_APPLY_ACTIONS: u16 = 4;
const OFPAT_OUTPUT: u16 = 0;

/// OXM match fields used by this controller (OFPXMT_OFB_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OxmField {
    EthDst,
    EthSrc,
    EthType,
}

impl OxmField {
    pub fn wire(self) -> u8 {
        match self {
            Self::EthDst => 3,
            Self::EthSrc => 4,
            Self::EthType => 5,
        }
    }

    fn from_wire(field: u8) -> Result<Self, CodecError> {
        match field {
            3 => Ok(Self::EthDst),
            4 => Ok(Self::EthSrc),
            5 => Ok(Self::EthType),
            other => Err(CodecError::UnsupportedOxm {
                class: OFPXMC_OPENFLOW_BASIC,
                field: other,
            }),
        }
    }
}

/// One OXM type-length-value entry (openflow-basic class, no mask).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OxmTlv {
    pub field: OxmField,
    pub value: Vec<u8>,
}

impl OxmTlv {
    pub fn eth_type(ether_type: u16) -> Self {
        Self {
            field: OxmField::EthType,
            value: ether_type.to_be_bytes().to_vec(),
        }
    }

    pub fn eth_src(mac: MacAddr) -> Self {
        Self {
            field: OxmField::EthSrc,
            value: mac.0.to_vec(),
        }
    }

    pub fn eth_dst(mac: MacAddr) -> Self {
        Self {
            field: OxmField::EthDst,
            value: mac.0.to_vec(),
        }
    }

    fn wire_len(&self) -> usize {
        4 + self.value.len()
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        wire::put_u16(buf, OFPXMC_OPENFLOW_BASIC);
        // low bit of the field byte is the hasmask flag, always clear here
        wire::put_u8(buf, self.field.wire() << 1);
        wire::put_u8(buf, self.value.len() as u8);
        buf.extend_from_slice(&self.value);
    }
}

/// OpenFlow 1.3 flow match: an ordered OXM list.
///
/// The entry order is preserved exactly as given; peers may compare match
/// structures bytewise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Match {
    pub oxm_fields: Vec<OxmTlv>,
}

impl Match {
    /// Match on the link-layer triple, in the fixed field order
    /// (eth_type, eth_src, eth_dst).
    pub fn link_exact(dl_src: MacAddr, dl_dst: MacAddr, dl_type: u16) -> Self {
        Self {
            oxm_fields: vec![
                OxmTlv::eth_type(dl_type),
                OxmTlv::eth_src(dl_src),
                OxmTlv::eth_dst(dl_dst),
            ],
        }
    }

    fn unpadded_len(&self) -> usize {
        4 + self
            .oxm_fields
            .iter()
            .map(OxmTlv::wire_len)
            .sum::<usize>()
    }

    /// Size on the wire including trailing pad to an 8-byte boundary.
    pub fn wire_len(&self) -> usize {
        (self.unpadded_len() + 7) & !7
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        let unpadded = self.unpadded_len();
        wire::put_u16(buf, OFPMT_OXM);
        wire::put_u16(buf, unpadded as u16);
        for tlv in &self.oxm_fields {
            tlv.encode(buf);
        }
        wire::pad(buf, self.wire_len() - unpadded);
    }

    /// Decodes an OXM match, preserving entry order.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(data, "of1.3 match");
        if r.u16()? != OFPMT_OXM {
            return Err(CodecError::BadMatch("match type is not OFPMT_OXM"));
        }
        let length = r.u16()? as usize;
        if length < 4 {
            return Err(CodecError::BadMatch("match length shorter than header"));
        }

        let mut oxm_fields = Vec::new();
        let mut consumed = 4;
        while consumed < length {
            let class = r.u16()?;
            let field_byte = r.u8()?;
            let value_len = r.u8()? as usize;
            if class != OFPXMC_OPENFLOW_BASIC || field_byte & 0x01 != 0 {
                return Err(CodecError::UnsupportedOxm {
                    class,
                    field: field_byte >> 1,
                });
            }
            let field = OxmField::from_wire(field_byte >> 1)?;
            let value = r.bytes(value_len)?.to_vec();
            oxm_fields.push(OxmTlv { field, value });
            consumed += 4 + value_len;
        }
        if consumed != length {
            return Err(CodecError::BadMatch("oxm entries overrun match length"));
        }
        Ok(Self { oxm_fields })
    }
}

/// Single output action (OFPAT_OUTPUT), 16 bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionOutput {
    pub port: u32,
    pub max_len: u16,
}

impl ActionOutput {
    pub fn new(port: u32) -> Self {
        Self { port, max_len: 0 }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        wire::put_u16(buf, OFPAT_OUTPUT);
        wire::put_u16(buf, ACTION_OUTPUT_LEN as u16);
        wire::put_u32(buf, self.port);
        wire::put_u16(buf, self.max_len);
        wire::pad(buf, 6);
    }
}

/// OFPIT_APPLY_ACTIONS instruction wrapping the action list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionApplyActions {
    pub actions: Vec<ActionOutput>,
}

impl InstructionApplyActions {
    pub fn new(actions: Vec<ActionOutput>) -> Self {
        Self { actions }
    }

    fn wire_len(&self) -> usize {
        8 + self.actions.len() * ACTION_OUTPUT_LEN
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        wire::put_u16(buf, OFPIT_APPLY_ACTIONS);
        wire::put_u16(buf, self.wire_len() as u16);
        wire::pad(buf, 4);
        for action in &self.actions {
            action.encode(buf);
        }
    }
}

/// OFPT_FLOW_MOD message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowMod {
    #[serde(skip)]
    pub xid: u32,
    pub cookie: u64,
    pub cookie_mask: u64,
    pub table_id: u8,
    pub command: FlowModCommand,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
    pub buffer_id: u32,
    pub out_port: u32,
    pub out_group: u32,
    pub flags: u16,
    pub flow_match: Match,
    pub instructions: Vec<InstructionApplyActions>,
}

impl Default for FlowMod {
    fn default() -> Self {
        Self {
            xid: 0,
            cookie: 0,
            cookie_mask: 0,
            table_id: 0,
            command: FlowModCommand::Add,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: 0,
            buffer_id: OFP_NO_BUFFER,
            out_port: OFPP_ANY,
            out_group: OFPG_ANY,
            flags: 0,
            flow_match: Match::default(),
            instructions: Vec::new(),
        }
    }
}

impl FlowMod {
    pub fn encode(&self) -> Vec<u8> {
        let length = HEADER_LEN
            + 40
            + self.flow_match.wire_len()
            + self
                .instructions
                .iter()
                .map(InstructionApplyActions::wire_len)
                .sum::<usize>();
        let mut buf = wire::header(WIRE_VERSION, OFPT_FLOW_MOD, length as u16, self.xid);
        wire::put_u64(&mut buf, self.cookie);
        wire::put_u64(&mut buf, self.cookie_mask);
        wire::put_u8(&mut buf, self.table_id);
        wire::put_u8(&mut buf, self.command.wire());
        wire::put_u16(&mut buf, self.idle_timeout);
        wire::put_u16(&mut buf, self.hard_timeout);
        wire::put_u16(&mut buf, self.priority);
        wire::put_u32(&mut buf, self.buffer_id);
        wire::put_u32(&mut buf, self.out_port);
        wire::put_u32(&mut buf, self.out_group);
        wire::put_u16(&mut buf, self.flags);
        wire::pad(&mut buf, 2);
        self.flow_match.encode(&mut buf);
        for instruction in &self.instructions {
            instruction.encode(&mut buf);
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
    pub in_port: u32,
    pub actions: Vec<ActionOutput>,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl PacketOut {
    pub fn encode(&self) -> Vec<u8> {
        let actions_len = self.actions.len() * ACTION_OUTPUT_LEN;
        let length = HEADER_LEN + 16 + actions_len + self.data.len();
        let mut buf = wire::header(WIRE_VERSION, OFPT_PACKET_OUT, length as u16, self.xid);
        wire::put_u32(&mut buf, self.buffer_id);
        wire::put_u32(&mut buf, self.in_port);
        wire::put_u16(&mut buf, actions_len as u16);
        wire::pad(&mut buf, 6);
        for action in &self.actions {
            action.encode(&mut buf);
        }
        buf.extend_from_slice(&self.data);
        buf
    }
}
