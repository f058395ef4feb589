//! # Identity File Source
//!
//! The signer drops the node's signed identity as JSON on disk. This module
//! loads it into a [`SharedIdentity`] and keeps it fresh by re-reading the
//! file on a fixed period.

use statusheart_core::{SharedIdentity, SignedIdentity, StatusHeartError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often the identity file is re-read.
pub const IDENTITY_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum identity file size (64 KB).
const MAX_IDENTITY_FILE_SIZE: u64 = 64 * 1024;

/// Read and parse the identity JSON at `path`.
pub fn load_identity(path: &Path) -> Result<SignedIdentity, StatusHeartError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        StatusHeartError::IoError(format!("Cannot read identity '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_IDENTITY_FILE_SIZE {
        return Err(StatusHeartError::SerializationError(format!(
            "identity file {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_IDENTITY_FILE_SIZE
        )));
    }

    let contents = std::fs::read(path).map_err(|e| {
        StatusHeartError::IoError(format!("Cannot read identity '{}': {}", path.display(), e))
    })?;
    serde_json::from_slice(&contents)
        .map_err(|e| StatusHeartError::SerializationError(format!("identity: {e}")))
}

/// Load `path` into `store` once. A missing or broken file leaves the
/// store untouched. Returns whether the stored identity changed.
pub fn refresh_identity(path: &Path, store: &SharedIdentity) -> bool {
    match load_identity(path) {
        Ok(identity) => {
            let changed = store.publish(identity);
            if changed {
                tracing::info!(path = %path.display(), "signed identity updated");
            }
            changed
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "identity file not loaded");
            false
        }
    }
}

/// Re-read `path` into `store` every `period` for the life of the process.
pub fn spawn_refresh(path: PathBuf, store: SharedIdentity, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            refresh_identity(&path, &store);
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
