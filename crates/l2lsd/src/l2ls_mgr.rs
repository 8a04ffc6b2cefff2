//! L2lsMgr - the learning-switch event handlers.
//!
//! Two entry points, one per consumed event kind:
//!
//! - switch connect: install the table-miss flow where the protocol version
//!   requires one;
//! - packet-in: validate, learn the source port, resolve the destination and
//!   emit a learned flow and/or a packet-out.

use std::sync::Arc;

use ofp_codec::{
    builder, DatapathId, EthernetFrame, ForwardingRule, ImmediateAction, PacketInReason,
    ProtocolVersion,
};
use tracing::{debug, info, instrument, warn};

use crate::config::L2lsConfig;
use crate::error::Result;
use crate::events::{PacketInEvent, SwitchEvent};
use crate::registry::{AddressTable, InterfaceState};
use crate::sink::{OutboundMessage, OutboundSink};

/// Learning-switch manager.
pub struct L2lsMgr {
    config: L2lsConfig,
    table: Arc<dyn AddressTable>,
    ifstate: Arc<dyn InterfaceState>,
    sink: Arc<dyn OutboundSink>,
}

impl L2lsMgr {
    pub fn new(
        config: L2lsConfig,
        table: Arc<dyn AddressTable>,
        ifstate: Arc<dyn InterfaceState>,
        sink: Arc<dyn OutboundSink>,
    ) -> Self {
        Self {
            config,
            table,
            ifstate,
            sink,
        }
    }

    /// Handles one event; errors are scoped to this event only.
    pub async fn handle_event(&self, event: SwitchEvent) -> Result<()> {
        match event {
            SwitchEvent::Connected { dpid, version } => {
                self.handle_switch_new(dpid, version).await
            }
            SwitchEvent::PacketIn(event) => self.handle_packet_in(event).await,
        }
    }

    /// Installs the table-miss flow on versions that drop unmatched frames
    /// by default. Reinstalling on reconnect is harmless; the device
    /// deduplicates by match and priority.
    #[instrument(skip(self), fields(dpid = %dpid))]
    pub async fn handle_switch_new(&self, dpid: DatapathId, version: u8) -> Result<()> {
        let version = ProtocolVersion::from_wire(version)?;
        if !version.needs_table_miss() {
            debug!(%version, "switch handles unmatched frames by default");
            return Ok(());
        }

        let message = builder::table_miss_flow(version, self.config.table_miss_priority);
        self.sink.try_send(OutboundMessage { dpid, message })?;
        info!("installed table-miss flow");
        Ok(())
    }

    /// Runs one frame through validate -> learn -> resolve -> emit.
    #[instrument(skip(self, event), fields(dpid = %event.dpid, in_port = event.in_port))]
    pub async fn handle_packet_in(&self, event: PacketInEvent) -> Result<()> {
        let frame = EthernetFrame::decode(&event.data)?;
        let (src, dst, ether_type) = (frame.source, frame.destination, frame.ether_type);

        if self.config.is_ignored(&dst) {
            debug!(%dst, "ignoring control-plane destination");
            return Ok(());
        }
        // Frames steered here by an installed flow (or an invalid TTL) were
        // already decided; only the table-miss path produces new state.
        if !matches!(
            PacketInReason::from_wire(event.reason),
            Ok(PacketInReason::NoMatch)
        ) {
            debug!(reason = event.reason, "not a table-miss, nothing to do");
            return Ok(());
        }

        let version = ProtocolVersion::from_wire(event.version)?;

        self.table.learn(event.dpid, src, event.in_port).await?;
        let ports = self.table.lookup(event.dpid, dst).await?;

        let out_port = match ports.first().copied() {
            Some(port) => match self.ifstate.is_forwarding_enabled(event.dpid, port).await {
                Ok(true) => Some(port),
                Ok(false) => {
                    debug!(%dst, port, "destination port administratively down");
                    return Ok(());
                }
                Err(err) => {
                    warn!(%dst, port, error = %err, "admin state unresolved, suppressing forwarding");
                    return Ok(());
                }
            },
            None => None,
        };

        // Install the learned path before the reactive packet-out so further
        // frames stop hitting the controller as soon as possible.
        if let Some(port) = out_port {
            let rule = ForwardingRule {
                dl_src: src,
                dl_dst: dst,
                dl_type: ether_type,
                out_port: port,
            };
            let message = builder::learned_flow(version, &rule, self.config.flow_priority)?;
            self.sink.try_send(OutboundMessage {
                dpid: event.dpid,
                message,
            })?;
            info!(%src, %dst, port, "installed learned flow");
        } else {
            debug!(%dst, "destination unknown, flooding");
        }

        let action = ImmediateAction {
            out_port,
            buffer_id: event.buffer_id,
            in_port: event.in_port,
            data: event.data,
        };
        let message = builder::packet_out(version, action)?;
        self.sink.try_send(OutboundMessage {
            dpid: event.dpid,
            message,
        })?;
        Ok(())
    }
}
