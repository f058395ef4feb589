//! # Transaction Gateway
//!
//! The seam between the heartbeat service and the ledger.
//!
//! ```text
//! HeartbeatService
//!      │  TxRequest { to, data, value, description }
//!      ▼
//! dyn TransactionGateway ── send / call / wait_for_receipt
//!      │
//!      ▼
//! JsonRpcGateway (eth_sendTransaction, eth_call, eth_getTransactionReceipt)
//! ```
//!
//! Gateways do not retry. The scheduler's next tick is the only retry.

mod rpc;

pub use rpc::{JsonRpcGateway, RpcGatewayConfig};

use async_trait::async_trait;
use statusheart_core::{Bytes, StatusHeartError, TxHash, TxReceipt, TxRequest};

/// Async transport to the ledger.
///
/// The trait is object-safe and requires `Send + Sync` so one gateway can
/// be shared by the scheduler and every confirmation task.
///
/// ## Contract
///
/// - `send` returns as soon as the transaction is accepted, not when final.
/// - `call` never changes ledger state.
/// - `wait_for_receipt` resolves once the transaction is final, or errors
///   when the gateway gives up waiting.
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Submit `request` as a transaction and return its identifier.
    async fn send(&self, request: &TxRequest) -> Result<TxHash, StatusHeartError>;

    /// Run `request` as a read-only query and return the raw result.
    async fn call(&self, request: &TxRequest) -> Result<Bytes, StatusHeartError>;

    /// Wait until `tx_hash` is final and return its receipt.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, StatusHeartError>;
}
