//! # JSON-RPC Gateway
//!
//! [`TransactionGateway`] over an Ethereum-style JSON-RPC endpoint.
//!
//! The ledger node holds the signing key for `from` (or its default
//! account); this gateway only forwards unsigned transaction objects.

use super::TransactionGateway;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use statusheart_core::{Address, Bytes, StatusHeartError, TxHash, TxReceipt, TxRequest, U256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Connection settings for [`JsonRpcGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcGatewayConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,
    /// Sending account; the node's default account when `None`.
    pub from: Option<Address>,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// How long `wait_for_receipt` keeps polling.
    pub receipt_timeout: Duration,
    /// Delay between receipt polls.
    pub receipt_poll: Duration,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Transaction/call object as the node expects it.
#[derive(Debug, Serialize)]
struct CallObject<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    to: Address,
    data: &'a Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<U256>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RpcReceipt {
    fn into_receipt(self) -> TxReceipt {
        TxReceipt {
            tx_hash: self.transaction_hash,
            block_number: self.block_number.as_deref().and_then(parse_quantity),
            // Receipts without a status field predate status codes; inclusion is success
            success: self
                .status
                .as_deref()
                .and_then(parse_quantity)
                .is_none_or(|status| status == 1),
        }
    }
}

/// Parse a hex quantity such as `0x1b4`.
fn parse_quantity(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16).ok()
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failure of a single JSON-RPC exchange.
#[derive(Debug)]
enum RpcError {
    /// Cannot reach the endpoint.
    Transport(String),
    /// Non-success HTTP status.
    Status(u16, String),
    /// The node answered with a JSON-RPC error object.
    Rpc(i64, String),
    /// Response body was not the expected JSON.
    Parse(String),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport failure: {msg}"),
            Self::Status(status, body) => write!(f, "HTTP {status}: {body}"),
            Self::Rpc(code, msg) => write!(f, "rpc error {code}: {msg}"),
            Self::Parse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

/// Gateway that talks JSON-RPC 2.0 over HTTP.
pub struct JsonRpcGateway {
    http: reqwest::Client,
    config: RpcGatewayConfig,
    next_id: AtomicU64,
}

impl JsonRpcGateway {
    /// Create a gateway for `config`.
    pub fn new(config: RpcGatewayConfig) -> Result<Self, StatusHeartError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StatusHeartError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint this gateway talks to.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Issue one JSON-RPC request. `Ok(None)` is a `null` result.
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "rpc request");

        let resp = self
            .http
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{}: {e}", self.config.url)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RpcError::Status(status.as_u16(), text));
        }

        let parsed: RpcResponse<T> = resp
            .json()
            .await
            .map_err(|e| RpcError::Parse(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(RpcError::Rpc(err.code, err.message));
        }
        Ok(parsed.result)
    }

    fn call_object<'a>(&self, request: &'a TxRequest, with_value: bool) -> CallObject<'a> {
        CallObject {
            from: self.config.from,
            to: request.to,
            data: &request.data,
            value: with_value.then_some(request.value),
        }
    }
}

#[async_trait]
impl TransactionGateway for JsonRpcGateway {
    async fn send(&self, request: &TxRequest) -> Result<TxHash, StatusHeartError> {
        let params = json!([self.call_object(request, true)]);
        let hash: Option<TxHash> = self
            .request("eth_sendTransaction", params)
            .await
            .map_err(|e| StatusHeartError::Submission(format!("{}: {e}", request.description)))?;

        let hash = hash.ok_or_else(|| {
            StatusHeartError::Submission(format!("{}: node returned no hash", request.description))
        })?;
        tracing::debug!(tx = %hash, description = %request.description, "transaction sent");
        Ok(hash)
    }

    async fn call(&self, request: &TxRequest) -> Result<Bytes, StatusHeartError> {
        let params = json!([self.call_object(request, false), "latest"]);
        let result: Option<Bytes> = self
            .request("eth_call", params)
            .await
            .map_err(|e| StatusHeartError::Query(e.to_string()))?;
        Ok(result.unwrap_or_default())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, StatusHeartError> {
        let deadline = tokio::time::Instant::now() + self.config.receipt_timeout;

        loop {
            // A failed poll is retried like a pending one until the deadline.
            let last_error = match self
                .request::<RpcReceipt>("eth_getTransactionReceipt", json!([tx_hash]))
                .await
            {
                Ok(Some(receipt)) => return Ok(receipt.into_receipt()),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(tx = %tx_hash, error = %e, "receipt poll failed");
                    Some(e)
                }
            };

            if tokio::time::Instant::now() + self.config.receipt_poll > deadline {
                let reason = match last_error {
                    Some(e) => format!("last poll: {e}"),
                    None => "still pending".to_string(),
                };
                return Err(StatusHeartError::Confirmation(format!(
                    "no receipt for {tx_hash} after {:?} ({reason})",
                    self.config.receipt_timeout
                )));
            }
            tokio::time::sleep(self.config.receipt_poll).await;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
