//! Version-dispatching message construction.
//!
//! Handlers describe what they want (install a learned flow, push a frame
//! out) and the builder produces the version-correct wire structure. All
//! functions are pure; the version-specific layout rules stay in [`crate::of10`]
//! and [`crate::of13`], the reserved port numbers in
//! [`LogicalPort`][crate::types::LogicalPort].

use serde::Serialize;

use crate::error::CodecError;
use crate::types::{LogicalPort, MacAddr, ProtocolVersion};
use crate::{of10, of13};

/// Intent to persist a learned unicast path on the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardingRule {
    pub dl_src: MacAddr,
    pub dl_dst: MacAddr,
    pub dl_type: u16,
    pub out_port: u32,
}

/// Intent to forward the frame currently held by the switch.
///
/// Carries the buffer id, ingress port and raw frame bytes exactly as they
/// arrived in the packet-in event. `out_port == None` means flood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateAction {
    pub out_port: Option<u32>,
    pub buffer_id: u32,
    pub in_port: u32,
    pub data: Vec<u8>,
}

/// A finished, version-tagged control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Message {
    FlowMod10(of10::FlowMod),
    FlowMod13(of13::FlowMod),
    PacketOut10(of10::PacketOut),
    PacketOut13(of13::PacketOut),
}

impl Message {
    pub fn version(&self) -> ProtocolVersion {
        match self {
            Self::FlowMod10(_) | Self::PacketOut10(_) => ProtocolVersion::OpenFlow10,
            Self::FlowMod13(_) | Self::PacketOut13(_) => ProtocolVersion::OpenFlow13,
        }
    }

    pub fn is_flow_mod(&self) -> bool {
        matches!(self, Self::FlowMod10(_) | Self::FlowMod13(_))
    }

    /// Serializes the full message, OpenFlow header included.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::FlowMod10(m) => m.encode(),
            Self::FlowMod13(m) => m.encode(),
            Self::PacketOut10(m) => m.encode(),
            Self::PacketOut13(m) => m.encode(),
        }
    }
}

/// Builds the wildcard table-miss flow: match everything, deliver to the
/// controller. `priority` is the configured wildcard-default priority,
/// below any learned flow.
pub fn table_miss_flow(version: ProtocolVersion, priority: u16) -> Message {
    let controller = LogicalPort::Controller.encode(version);
    match version {
        ProtocolVersion::OpenFlow10 => Message::FlowMod10(of10::FlowMod {
            priority,
            actions: vec![of10::ActionOutput {
                port: controller as u16,
                max_len: of10::MAX_LEN_SEND_ALL,
            }],
            ..Default::default()
        }),
        ProtocolVersion::OpenFlow13 => Message::FlowMod13(of13::FlowMod {
            priority,
            instructions: vec![of13::InstructionApplyActions::new(vec![
                of13::ActionOutput {
                    port: controller,
                    max_len: of13::OFPCML_NO_BUFFER,
                },
            ])],
            ..Default::default()
        }),
    }
}

/// Builds the flow-mod installing a learned forwarding rule.
pub fn learned_flow(
    version: ProtocolVersion,
    rule: &ForwardingRule,
    priority: u16,
) -> Result<Message, CodecError> {
    match version {
        ProtocolVersion::OpenFlow10 => {
            let port = port10(rule.out_port)?;
            Ok(Message::FlowMod10(of10::FlowMod {
                flow_match: of10::Match::link_exact(rule.dl_src, rule.dl_dst, rule.dl_type),
                priority,
                actions: vec![of10::ActionOutput::new(port)],
                ..Default::default()
            }))
        }
        ProtocolVersion::OpenFlow13 => Ok(Message::FlowMod13(of13::FlowMod {
            flow_match: of13::Match::link_exact(rule.dl_src, rule.dl_dst, rule.dl_type),
            priority,
            instructions: vec![of13::InstructionApplyActions::new(vec![
                of13::ActionOutput::new(rule.out_port),
            ])],
            ..Default::default()
        })),
    }
}

/// Builds the packet-out pushing the buffered frame to its destination, or
/// flooding it when no output port was resolved.
pub fn packet_out(
    version: ProtocolVersion,
    action: ImmediateAction,
) -> Result<Message, CodecError> {
    match version {
        ProtocolVersion::OpenFlow10 => {
            let out = match action.out_port {
                Some(port) => port10(port)?,
                None => LogicalPort::Flood.encode(version) as u16,
            };
            Ok(Message::PacketOut10(of10::PacketOut {
                xid: 0,
                buffer_id: action.buffer_id,
                in_port: port10(action.in_port)?,
                actions: vec![of10::ActionOutput::new(out)],
                data: action.data,
            }))
        }
        ProtocolVersion::OpenFlow13 => {
            let out = action
                .out_port
                .unwrap_or_else(|| LogicalPort::Flood.encode(version));
            Ok(Message::PacketOut13(of13::PacketOut {
                xid: 0,
                buffer_id: action.buffer_id,
                in_port: action.in_port,
                actions: vec![of13::ActionOutput::new(out)],
                data: action.data,
            }))
        }
    }
}

fn port10(port: u32) -> Result<u16, CodecError> {
    u16::try_from(port).map_err(|_| CodecError::PortOutOfRange(port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mac(s: &str) -> MacAddr {
        s.parse().unwrap()
    }

    fn rule() -> ForwardingRule {
        ForwardingRule {
            dl_src: mac("aa:aa:aa:aa:aa:aa"),
            dl_dst: mac("bb:bb:bb:bb:bb:bb"),
            dl_type: 0x0800,
            out_port: 3,
        }
    }

    #[test]
    fn test_learned_flow_of10() {
        let msg = learned_flow(ProtocolVersion::OpenFlow10, &rule(), 10).unwrap();
        assert!(msg.is_flow_mod());
        let flow_mod = match msg {
            Message::FlowMod10(m) => m,
            other => panic!("expected FlowMod10, got {other:?}"),
        };
        assert_eq!(flow_mod.flow_match.dl_src, mac("aa:aa:aa:aa:aa:aa"));
        assert_eq!(flow_mod.flow_match.dl_dst, mac("bb:bb:bb:bb:bb:bb"));
        assert_eq!(flow_mod.flow_match.dl_type, 0x0800);
        assert_eq!(flow_mod.priority, 10);
        assert_eq!(flow_mod.command.wire(), 0);
        assert_eq!(flow_mod.actions, vec![of10::ActionOutput::new(3)]);
    }

    #[test]
    fn test_learned_flow_of13() {
        let msg = learned_flow(ProtocolVersion::OpenFlow13, &rule(), 10).unwrap();
        let flow_mod = match msg {
            Message::FlowMod13(m) => m,
            other => panic!("expected FlowMod13, got {other:?}"),
        };
        let fields: Vec<(of13::OxmField, &[u8])> = flow_mod
            .flow_match
            .oxm_fields
            .iter()
            .map(|t| (t.field, t.value.as_slice()))
            .collect();
        assert_eq!(
            fields,
            vec![
                (of13::OxmField::EthType, &0x0800u16.to_be_bytes()[..]),
                (of13::OxmField::EthSrc, &[0xaa; 6][..]),
                (of13::OxmField::EthDst, &[0xbb; 6][..]),
            ]
        );
        assert_eq!(flow_mod.instructions.len(), 1);
        assert_eq!(
            flow_mod.instructions[0].actions,
            vec![of13::ActionOutput::new(3)]
        );
        assert_eq!(flow_mod.priority, 10);
    }

    #[test]
    fn test_learned_flow_of10_port_overflow() {
        let mut wide = rule();
        wide.out_port = 0x1_0000;
        assert!(matches!(
            learned_flow(ProtocolVersion::OpenFlow10, &wide, 10),
            Err(CodecError::PortOutOfRange(0x1_0000))
        ));
    }

    #[test]
    fn test_table_miss_of13() {
        let msg = table_miss_flow(ProtocolVersion::OpenFlow13, 0);
        let flow_mod = match msg {
            Message::FlowMod13(m) => m,
            other => panic!("expected FlowMod13, got {other:?}"),
        };
        assert!(flow_mod.flow_match.oxm_fields.is_empty());
        assert_eq!(flow_mod.priority, 0);
        assert_eq!(flow_mod.instructions[0].actions.len(), 1);
        let action = flow_mod.instructions[0].actions[0];
        assert_eq!(action.port, 0xffff_fffd);
        assert_eq!(action.max_len, of13::OFPCML_NO_BUFFER);
    }

    #[test]
    fn test_table_miss_of10() {
        let msg = table_miss_flow(ProtocolVersion::OpenFlow10, 0);
        let flow_mod = match msg {
            Message::FlowMod10(m) => m,
            other => panic!("expected FlowMod10, got {other:?}"),
        };
        // wildcard-everything match, controller-bound action
        assert_eq!(flow_mod.flow_match, of10::Match::default());
        assert_eq!(flow_mod.actions[0].port, 0xfffd);
    }

    #[test]
    fn test_packet_out_unicast() {
        let action = ImmediateAction {
            out_port: Some(3),
            buffer_id: 99,
            in_port: 1,
            data: vec![0xab],
        };
        let msg = packet_out(ProtocolVersion::OpenFlow10, action).unwrap();
        let packet_out = match msg {
            Message::PacketOut10(m) => m,
            other => panic!("expected PacketOut10, got {other:?}"),
        };
        assert_eq!(packet_out.buffer_id, 99);
        assert_eq!(packet_out.in_port, 1);
        assert_eq!(packet_out.actions, vec![of10::ActionOutput::new(3)]);
        assert_eq!(packet_out.data, vec![0xab]);
    }

    #[test]
    fn test_packet_out_flood_uses_version_encoding() {
        fn flood() -> ImmediateAction {
            ImmediateAction {
                out_port: None,
                buffer_id: 1,
                in_port: 2,
                data: Vec::new(),
            }
        }

        match packet_out(ProtocolVersion::OpenFlow10, flood()).unwrap() {
            Message::PacketOut10(m) => assert_eq!(m.actions[0].port, 0xfffb),
            other => panic!("expected PacketOut10, got {other:?}"),
        }
        match packet_out(ProtocolVersion::OpenFlow13, flood()).unwrap() {
            Message::PacketOut13(m) => assert_eq!(m.actions[0].port, 0xffff_fffb),
            other => panic!("expected PacketOut13, got {other:?}"),
        }
    }

    #[test]
    fn test_packet_out_of10_in_port_overflow() {
        let action = ImmediateAction {
            out_port: None,
            buffer_id: 1,
            in_port: 0x2_0000,
            data: Vec::new(),
        };
        assert!(packet_out(ProtocolVersion::OpenFlow10, action).is_err());
    }

    #[test]
    fn test_message_encode_dispatch() {
        let flood = ImmediateAction {
            out_port: None,
            buffer_id: 1,
            in_port: 2,
            data: vec![0; 14],
        };
        let msg = packet_out(ProtocolVersion::OpenFlow13, flood).unwrap();
        let buf = msg.encode();
        assert_eq!(buf[0], 0x04);
        assert_eq!(msg.version(), ProtocolVersion::OpenFlow13);
        assert!(!msg.is_flow_mod());
    }
}
