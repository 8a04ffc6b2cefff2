//! Outbound message sinks.
//!
//! Handlers never block on delivery: [`OutboundSink::try_send`] either
//! enqueues or fails immediately, so a saturated connection to one switch
//! cannot stall packet-in handling for the rest.

use ofp_codec::{DatapathId, Message};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SinkError;

/// A finished message addressed to a device.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub dpid: DatapathId,
    pub message: Message,
}

/// Delivery seam between the handlers and the transport.
pub trait OutboundSink: Send + Sync {
    /// Hands the message off without blocking; `Err` when saturated or
    /// disconnected.
    fn try_send(&self, msg: OutboundMessage) -> Result<(), SinkError>;
}

/// Bounded queue sink; the receiver side belongs to the connection layer.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<OutboundMessage>,
}

impl QueueSink {
    /// Creates the sink and the receiver the transport drains.
    pub fn bounded(depth: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(depth);
        (Self { tx }, rx)
    }
}

impl OutboundSink for QueueSink {
    fn try_send(&self, msg: OutboundMessage) -> Result<(), SinkError> {
        self.tx.try_send(msg).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

/// Management-endpoint deployment mode: flow rules are POSTed as JSON to an
/// external flow service while packet-outs still travel the raw queue.
///
/// A worker task drains an internal bounded queue so the handler-side
/// contract stays fail-fast.
pub struct FlowApiSink {
    rules: mpsc::Sender<OutboundMessage>,
    packets: QueueSink,
}

impl FlowApiSink {
    /// Spawns the submission worker and returns the sink handle.
    pub fn spawn(
        base_url: impl Into<String>,
        depth: usize,
        packets: QueueSink,
    ) -> (Self, JoinHandle<()>) {
        let base_url = base_url.into();
        let (rules, mut rx) = mpsc::channel::<OutboundMessage>(depth);
        let worker = tokio::spawn(async move {
            let client = reqwest::Client::new();
            while let Some(msg) = rx.recv().await {
                submit_flow(&client, &base_url, &msg).await;
            }
        });
        (Self { rules, packets }, worker)
    }
}

impl OutboundSink for FlowApiSink {
    fn try_send(&self, msg: OutboundMessage) -> Result<(), SinkError> {
        if !msg.message.is_flow_mod() {
            return self.packets.try_send(msg);
        }
        self.rules.try_send(msg).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

async fn submit_flow(client: &reqwest::Client, base_url: &str, msg: &OutboundMessage) {
    let url = format!("{}/flows/{}", base_url.trim_end_matches('/'), msg.dpid);
    let body = serde_json::json!({ "flows": [msg.message] });

    match client.post(&url).json(&body).send().await {
        Ok(response) if response.status().is_success() => {
            debug!(dpid = %msg.dpid, "flow submitted");
        }
        Ok(response) => {
            warn!(dpid = %msg.dpid, status = %response.status(), "flow submission rejected");
        }
        Err(err) => {
            warn!(dpid = %msg.dpid, error = %err, "flow submission failed");
        }
    }
}
