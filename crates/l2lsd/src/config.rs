//! Daemon configuration.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use ofp_codec::MacAddr;
use serde::Deserialize;

use crate::error::{L2lsError, Result};

/// Priority assigned to learned forwarding flows.
pub const DEFAULT_FLOW_PRIORITY: u16 = 10;

/// Priority of the wildcard table-miss flow, below any learned flow.
pub const DEFAULT_TABLE_MISS_PRIORITY: u16 = 0;

/// Default bound for the outbound message queue.
pub const DEFAULT_OUTBOUND_QUEUE_DEPTH: usize = 1024;

/// Destinations the handler never learns or forwards: the LLDP address used
/// by the discovery application plus the nearest-bridge group address.
static DEFAULT_IGNORED_MACS: Lazy<Vec<MacAddr>> = Lazy::new(|| {
    vec![
        MacAddr([0x01, 0x23, 0x20, 0x00, 0x00, 0x01]),
        MacAddr([0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e]),
    ]
});

/// Daemon configuration, loadable from a TOML file.
///
/// Every field has a default so an absent file or empty table is a valid
/// configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct L2lsConfig {
    /// Priority for learned forwarding flows.
    pub flow_priority: u16,

    /// Priority for the table-miss flow installed at connect time.
    pub table_miss_priority: u16,

    /// Destination addresses to ignore (control-plane discovery traffic).
    pub ignored_macs: Vec<MacAddr>,

    /// Capacity of the bounded outbound queue.
    pub outbound_queue_depth: usize,

    /// When set, learned and table-miss flows are submitted as JSON to this
    /// management endpoint instead of being queued as raw messages.
    pub flow_api_url: Option<String>,
}

impl Default for L2lsConfig {
    fn default() -> Self {
        Self {
            flow_priority: DEFAULT_FLOW_PRIORITY,
            table_miss_priority: DEFAULT_TABLE_MISS_PRIORITY,
            ignored_macs: DEFAULT_IGNORED_MACS.clone(),
            outbound_queue_depth: DEFAULT_OUTBOUND_QUEUE_DEPTH,
            flow_api_url: None,
        }
    }
}

impl L2lsConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|err| L2lsError::Config(err.to_string()))
    }

    /// Returns true if frames to this destination must be dropped unseen.
    pub fn is_ignored(&self, mac: &MacAddr) -> bool {
        self.ignored_macs.contains(mac)
    }
}
