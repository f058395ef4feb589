//! # Heartbeat Service
//!
//! Reports the node's signed identity to the status heart contract on a
//! fixed period.
//!
//! ```text
//! scheduler tick ─► check_report_status ─► report_status
//!                                             │
//!                         IdentityStore::read ┤
//!                         ReportBuilder::build┤ (None → skip, TxHash::ZERO)
//!                       TransactionGateway::send
//!                                             │
//!                                             └─► spawn confirmation watcher
//!                                                 (detached, only logs)
//! ```
//!
//! ## Error Policy
//!
//! - A bad contract address or a failed startup check aborts [`init`].
//! - Encoding and submission errors abort the current cycle only; they are
//!   returned to direct callers and swallowed by the scheduler.
//! - Confirmation watcher errors and panics are logged and dropped.

mod scheduler;
mod stats;

pub use stats::ReportStats;

use crate::gateway::TransactionGateway;
use statusheart_core::{
    Address, B256, CallEncoder, IdentityStore, REPORT_DESCRIPTION, ReportBuilder, ReportTask,
    SignedIdentity, StatusHeartError, TxHash, TxReceipt, decode_hash_ext,
};
use stats::StatsRecorder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Period between heartbeat reports.
pub const REPORT_STATUS_INTERVAL: Duration = Duration::from_secs(10);

// =============================================================================
// SERVICE
// =============================================================================

/// Reporter for one node. Clones share the same collaborators and counters.
#[derive(Clone)]
pub struct HeartbeatService {
    contract: Address,
    gateway: Arc<dyn TransactionGateway>,
    identity: Arc<dyn IdentityStore>,
    encoder: Arc<dyn CallEncoder>,
    stats: StatsRecorder,
}

impl HeartbeatService {
    /// Create a service reporting to `contract`. Nothing runs until
    /// [`HeartbeatHandle::start`] or a direct call.
    pub fn new(
        contract: Address,
        gateway: Arc<dyn TransactionGateway>,
        identity: Arc<dyn IdentityStore>,
        encoder: Arc<dyn CallEncoder>,
    ) -> Self {
        Self {
            contract,
            gateway,
            identity,
            encoder,
            stats: StatsRecorder::default(),
        }
    }

    /// Destination contract.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Current identity snapshot.
    pub fn identity(&self) -> SignedIdentity {
        self.identity.read()
    }

    /// Counters since startup.
    pub fn stats(&self) -> ReportStats {
        self.stats.snapshot()
    }

    /// Report the current identity once.
    ///
    /// Returns `TxHash::ZERO` without error while the identity is not
    /// established. On success a detached task watches for the receipt.
    pub async fn report_status(&self) -> Result<TxHash, StatusHeartError> {
        let submitted = self.submit_report().await?;
        Ok(submitted.map_or(TxHash::ZERO, |report| report.tx_hash))
    }

    /// Report once and keep the confirmation watcher's handle.
    ///
    /// `None` while the identity is not established. Dropping the returned
    /// handle detaches the watcher, which is what [`report_status`](Self::report_status) does.
    pub async fn submit_report(&self) -> Result<Option<SubmittedReport>, StatusHeartError> {
        self.stats.attempt();
        let identity = self.identity.read();

        let payload = match ReportBuilder::new(self.encoder.as_ref()).build(&identity) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!("identity not established yet, skipping report");
                self.stats.skipped();
                return Ok(None);
            }
            Err(e) => {
                self.stats.failed(e.to_string());
                return Err(e);
            }
        };

        let task = ReportTask::new(self.contract, payload);
        tracing::debug!(
            peer = %identity.peer_id,
            nonce = identity.nonce,
            signed_time = identity.signed_time,
            bytes = task.payload.len(),
            "submitting heart status"
        );

        let tx_hash = match self.gateway.send(&task.to_request(REPORT_DESCRIPTION)).await {
            Ok(hash) => hash,
            Err(e) => {
                self.stats.failed(e.to_string());
                return Err(e);
            }
        };

        let task = task.submitted(tx_hash);
        self.stats.submitted(tx_hash);
        tracing::info!(tx = %tx_hash, contract = %task.contract, peer = %identity.peer_id, "heart status reported");

        let confirmation = self.spawn_confirmation(tx_hash);
        Ok(Some(SubmittedReport {
            tx_hash,
            confirmation,
        }))
    }

    /// Report once, logging any failure before returning it.
    pub async fn check_report_status(&self) -> Result<(), StatusHeartError> {
        if let Err(e) = self.report_status().await {
            tracing::error!(error = %e, "report status failed");
            return Err(e);
        }
        Ok(())
    }

    /// Ask the contract which digest it expects the signer to sign for
    /// the current identity. Read-only; never submits a transaction.
    pub async fn gen_hash_ext(&self) -> Result<B256, StatusHeartError> {
        let identity = self.identity.read();
        let data = ReportBuilder::new(self.encoder.as_ref()).build_hash_ext(&identity)?;
        let task = ReportTask::new(self.contract, data);

        let result = self.gateway.call(&task.to_request("genHashExt")).await?;
        let digest = decode_hash_ext(&result)?;
        tracing::debug!(peer = %identity.peer_id, digest = %digest, "genHashExt");
        Ok(digest)
    }

    /// Watch `tx_hash` until final without blocking the caller.
    ///
    /// The watcher runs in its own task so a panic inside the gateway
    /// surfaces as a `JoinError` here instead of unwinding anywhere else.
    /// The returned task yields the receipt, or `None` if waiting failed.
    fn spawn_confirmation(&self, tx_hash: TxHash) -> JoinHandle<Option<TxReceipt>> {
        let gateway = Arc::clone(&self.gateway);
        let watcher = tokio::spawn(async move { gateway.wait_for_receipt(tx_hash).await });
        let stats = self.stats.clone();

        tokio::spawn(async move {
            match watcher.await {
                Ok(Ok(receipt)) => {
                    if receipt.success {
                        tracing::info!(tx = %tx_hash, block = ?receipt.block_number, "heart status confirmed");
                    } else {
                        tracing::warn!(tx = %tx_hash, block = ?receipt.block_number, "heart status transaction reverted");
                    }
                    stats.confirmed(receipt.success);
                    Some(receipt)
                }
                Ok(Err(e)) => {
                    tracing::warn!(tx = %tx_hash, error = %e, "waiting for heart status receipt failed");
                    stats.confirmation_failed();
                    None
                }
                Err(join_err) => {
                    if join_err.is_panic() {
                        let message = panic_payload_to_string(join_err.into_panic());
                        tracing::error!(tx = %tx_hash, "confirmation watcher panicked: {message}");
                    } else {
                        tracing::error!(tx = %tx_hash, "confirmation watcher failed: {join_err}");
                    }
                    stats.confirmation_failed();
                    None
                }
            }
        })
    }
}

fn panic_payload_to_string(payload: Box<dyn std::any::Any + Send + 'static>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}

/// A report the gateway accepted, with its confirmation watcher.
#[derive(Debug)]
pub struct SubmittedReport {
    /// Transaction identifier returned by the gateway.
    pub tx_hash: TxHash,
    /// Watcher task; resolves to the receipt, or `None` if waiting failed.
    pub confirmation: JoinHandle<Option<TxReceipt>>,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Owned handle to a running heartbeat: the service plus its scheduler.
///
/// Dropping the handle leaves the scheduler running for the life of the
/// process; call [`shutdown`](Self::shutdown) to stop it.
pub struct HeartbeatHandle {
    service: HeartbeatService,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    /// Start the periodic loop for `service`. The first tick fires one
    /// `period` from now.
    pub fn start(service: HeartbeatService, period: Duration) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(scheduler::run(service.clone(), period, rx));
        Self {
            service,
            shutdown,
            task,
        }
    }

    /// The running service.
    pub fn service(&self) -> &HeartbeatService {
        &self.service
    }

    /// Stop the scheduler and wait for the in-flight cycle to finish.
    ///
    /// Confirmation watchers already spawned keep running.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "heartbeat scheduler ended abnormally");
        }
    }
}

// =============================================================================
// INITIALIZATION
// =============================================================================

/// Validate `contract_address`, run the startup report, and start the
/// scheduler at [`REPORT_STATUS_INTERVAL`].
///
/// A failed startup report is fatal here even though the same failure in
/// a later tick is only logged.
pub async fn init(
    contract_address: &str,
    gateway: Arc<dyn TransactionGateway>,
    identity: Arc<dyn IdentityStore>,
    encoder: Arc<dyn CallEncoder>,
) -> Result<HeartbeatHandle, StatusHeartError> {
    let contract = parse_contract_address(contract_address)?;
    let service = HeartbeatService::new(contract, gateway, identity, encoder);

    service.check_report_status().await?;

    Ok(HeartbeatHandle::start(service, REPORT_STATUS_INTERVAL))
}

/// Parse the configured contract address; empty means no registry for
/// this network.
pub fn parse_contract_address(raw: &str) -> Result<Address, StatusHeartError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StatusHeartError::Config(
            "no known status heart address for this network".to_string(),
        ));
    }
    trimmed.parse::<Address>().map_err(|e| {
        StatusHeartError::Config(format!("invalid status heart address '{trimmed}': {e}"))
    })
}

// =============================================================================
// TESTS
// =============================================================================
