//! l2lsd - OpenFlow L2 Learning Switch Daemon
//!
//! Entry point: wires the registry, sinks and dispatcher together. The
//! switch connection layer feeds the inbound event channel and drains the
//! outbound queue.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use l2lsd::{Dispatcher, FlowApiSink, L2lsConfig, L2lsMgr, OutboundSink, QueueSink, SwitchRegistry};

/// Capacity of the inbound event channel.
const EVENT_QUEUE_DEPTH: usize = 1024;

#[derive(Parser, Debug)]
#[command(name = "l2lsd", about = "OpenFlow L2 learning switch controller")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Initializes tracing/logging subsystem
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => L2lsConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => L2lsConfig::default(),
    };

    info!("--- Starting l2lsd ---");

    let registry = Arc::new(SwitchRegistry::new());
    let (queue_sink, mut outbound) = QueueSink::bounded(config.outbound_queue_depth);

    let sink: Arc<dyn OutboundSink> = match &config.flow_api_url {
        Some(url) => {
            info!(url = %url, "submitting flows to management endpoint");
            let (sink, _worker) =
                FlowApiSink::spawn(url.clone(), config.outbound_queue_depth, queue_sink);
            Arc::new(sink)
        }
        None => Arc::new(queue_sink),
    };

    let mgr = Arc::new(L2lsMgr::new(
        config,
        registry.clone(),
        registry,
        sink,
    ));

    // The switch connection layer feeds `event_tx` with handshake and
    // packet-in events and drains `outbound` onto the device sockets.
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

    tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let wire = msg.message.encode();
            debug!(dpid = %msg.dpid, bytes = wire.len(), "outbound message ready");
        }
    });

    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::new(mgr, cancel.clone());
    let dispatch = tokio::spawn(dispatcher.run(event_rx));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutting down, waiting for in-flight events");
    cancel.cancel();
    drop(event_tx);
    dispatch.await.context("dispatcher task panicked")?;

    info!("l2lsd stopped");
    Ok(())
}
