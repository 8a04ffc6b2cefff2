//! Event dispatch loop.
//!
//! Pulls events off the inbound channel and hands each to its own task so
//! devices never block each other. Shutdown stops intake first, then waits
//! for in-flight handlers to finish.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::events::SwitchEvent;
use crate::l2ls_mgr::L2lsMgr;

pub struct Dispatcher {
    mgr: Arc<L2lsMgr>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(mgr: Arc<L2lsMgr>, cancel: CancellationToken) -> Self {
        Self {
            mgr,
            cancel,
            tracker: TaskTracker::new(),
        }
    }

    /// Runs until the channel closes or shutdown is requested. In-flight
    /// handler invocations complete before this returns.
    pub async fn run(self, mut events: mpsc::Receiver<SwitchEvent>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("shutdown requested, detaching from event source");
                    break;
                }
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else {
                        debug!("event channel closed");
                        break;
                    };
                    let mgr = Arc::clone(&self.mgr);
                    self.tracker.spawn(async move {
                        let dpid = event.dpid();
                        if let Err(err) = mgr.handle_event(event).await {
                            // Scoped to this event; other devices continue.
                            warn!(%dpid, error = %err, "event dropped");
                        }
                    });
                }
            }
        }
        self.tracker.close();
        self.tracker.wait().await;
    }
}
