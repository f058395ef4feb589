//! Report counters exposed through the status API.

use serde::{Deserialize, Serialize};
use statusheart_core::TxHash;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot of the reporter's activity since startup.
///
/// Served as-is by `GET /status`; `last_tx_hash` serializes as 0x-hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    /// Report cycles started (startup check and ticks).
    pub attempts: u64,
    /// Transactions accepted by the gateway.
    pub submitted: u64,
    /// Cycles skipped because the identity was not established.
    pub skipped: u64,
    /// Cycles aborted by an encoding or submission error.
    pub failed: u64,
    /// Submitted transactions that confirmed successfully.
    pub confirmed: u64,
    /// Submitted transactions that were included but reverted.
    pub reverted: u64,
    /// Confirmation watchers that errored or panicked.
    pub confirmation_failures: u64,
    /// Most recent accepted transaction.
    pub last_tx_hash: Option<TxHash>,
    /// Most recent cycle error.
    pub last_error: Option<String>,
    /// Unix time of the most recent attempt.
    pub last_attempt_unix: Option<u64>,
}

/// Shared, cheaply cloneable handle to the counters.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatsRecorder {
    inner: Arc<Mutex<ReportStats>>,
}

impl StatsRecorder {
    pub(crate) fn snapshot(&self) -> ReportStats {
        self.update(|stats| stats.clone())
    }

    pub(crate) fn attempt(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .ok();
        self.update(|stats| {
            stats.attempts += 1;
            stats.last_attempt_unix = now;
        });
    }

    pub(crate) fn skipped(&self) {
        self.update(|stats| stats.skipped += 1);
    }

    pub(crate) fn submitted(&self, tx_hash: TxHash) {
        self.update(|stats| {
            stats.submitted += 1;
            stats.last_tx_hash = Some(tx_hash);
            stats.last_error = None;
        });
    }

    pub(crate) fn failed(&self, error: String) {
        self.update(|stats| {
            stats.failed += 1;
            stats.last_error = Some(error);
        });
    }

    pub(crate) fn confirmed(&self, success: bool) {
        self.update(|stats| {
            if success {
                stats.confirmed += 1;
            } else {
                stats.reverted += 1;
            }
        });
    }

    pub(crate) fn confirmation_failed(&self) {
        self.update(|stats| stats.confirmation_failures += 1);
    }

    fn update<T>(&self, f: impl FnOnce(&mut ReportStats) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}
