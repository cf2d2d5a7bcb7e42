//! Node configuration.

use std::time::Duration;

use meshgram_parcel::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

use crate::NodeError;

/// Configuration for a mesh node core.
///
/// All fields have working defaults; a JSON document only needs to name the
/// fields it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Station identifier written into outgoing headers (e.g. a callsign).
    pub callsign: String,
    /// Maximum payload characters per data parcel.
    pub chunk_size: usize,
    /// Most messages kept in the retransmission archive.
    pub max_archived: usize,
    /// Seconds an archived message stays eligible for resends.
    pub retention_secs: u64,
    /// Bound on simultaneously reassembling messages.
    pub max_reassembling: usize,
    /// Seconds of inactivity before a stalled reassembly is reclaimed.
    pub reassembly_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            callsign: "NOCALL".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_archived: 1000,
            retention_secs: 60 * 60,
            max_reassembling: 64,
            reassembly_timeout_secs: 5 * 60,
        }
    }
}

impl NodeConfig {
    /// Load a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<NodeConfig, NodeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Archive retention window as a duration.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Stalled-reassembly timeout as a duration.
    pub fn reassembly_timeout(&self) -> Duration {
        Duration::from_secs(self.reassembly_timeout_secs)
    }
}
