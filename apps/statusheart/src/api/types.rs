//! # API Response Types

use crate::heartbeat::ReportStats;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Agent version.
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Heartbeat status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Destination contract, 0x-hex.
    pub contract: String,
    /// Peer id currently being reported; empty before onboarding.
    pub peer_id: String,
    /// Nonce of the current signed identity.
    pub nonce: u32,
    /// Seconds between reports.
    pub interval_secs: u64,
    /// Whether the identity is established and reports are being sent.
    pub reporting: bool,
    /// Report counters since startup.
    pub stats: ReportStats,
}
