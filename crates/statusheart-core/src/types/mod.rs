//! # Core Type Definitions
//!
//! This module contains the value types shared by the reporter and its
//! collaborators:
//! - The node's signed identity (`SignedIdentity`)
//! - One in-flight report (`ReportTask`)
//! - Gateway request/receipt shapes (`TxRequest`, `TxReceipt`)
//! - Error types (`StatusHeartError`)

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ledger transaction identifier. The zero hash means "nothing submitted".
pub type TxHash = B256;

// =============================================================================
// SIGNED IDENTITY
// =============================================================================

/// The node's signed identity statement, as published by the signer.
///
/// `chain_address` and `signature` are kept in the signer's 0x-hex text
/// form; the report builder parses them when a report is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignedIdentity {
    /// Node identifier. Empty until onboarding completes.
    pub peer_id: String,
    /// Identity creation timestamp (seconds).
    pub created_time: u32,
    /// Software/protocol version tag.
    pub version: String,
    /// Distinguishes successive signed statements.
    pub nonce: u32,
    /// Ledger account bound to the node, 0x-hex.
    pub chain_address: String,
    /// Signing timestamp (seconds).
    pub signed_time: u32,
    /// Signature over the fields above, 0x-hex.
    pub signature: String,
}

impl SignedIdentity {
    /// Whether the signer has populated this identity yet.
    #[must_use]
    pub fn is_established(&self) -> bool {
        !self.peer_id.is_empty()
    }
}

// =============================================================================
// REPORT TASK
// =============================================================================

/// One report on its way to the ledger.
///
/// Built per scheduler tick and dropped once the submission returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTask {
    /// Destination contract.
    pub contract: Address,
    /// Encoded `reportStatus` call.
    pub payload: Bytes,
    /// Set once the gateway accepted the transaction.
    pub tx_hash: Option<TxHash>,
}

impl ReportTask {
    /// Create a task that has not been submitted yet.
    #[must_use]
    pub fn new(contract: Address, payload: Bytes) -> Self {
        Self {
            contract,
            payload,
            tx_hash: None,
        }
    }

    /// Build the gateway request for this task.
    #[must_use]
    pub fn to_request(&self, description: &str) -> TxRequest {
        TxRequest {
            to: self.contract,
            data: self.payload.clone(),
            value: U256::ZERO,
            description: description.to_string(),
        }
    }

    /// Record the identifier the gateway returned.
    #[must_use]
    pub fn submitted(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }
}

// =============================================================================
// GATEWAY SHAPES
// =============================================================================

/// A contract call handed to the transaction gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Destination contract.
    pub to: Address,
    /// Encoded call data.
    pub data: Bytes,
    /// Native value transferred with the call.
    pub value: U256,
    /// Human-readable label, used in gateway logs.
    pub description: String,
}

/// Final outcome of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// The transaction this receipt belongs to.
    pub tx_hash: TxHash,
    /// Block that included the transaction, if reported.
    pub block_number: Option<u64>,
    /// `false` when the transaction was included but reverted.
    pub success: bool,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the status heart agent.
///
/// Only `Config` is fatal (and only during initialization); every other
/// variant aborts a single report cycle.
#[derive(Debug, Error)]
pub enum StatusHeartError {
    /// Missing or malformed configuration, e.g. the contract address.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The signed identity carries a value that cannot be reported.
    #[error("Invalid identity field `{field}`: {reason}")]
    InvalidIdentity {
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The call encoder rejected the report arguments.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The gateway failed to submit the transaction.
    #[error("Submission error: {0}")]
    Submission(String),

    /// A read-only contract query failed.
    #[error("Query error: {0}")]
    Query(String),

    /// Waiting for a transaction receipt failed.
    #[error("Confirmation error: {0}")]
    Confirmation(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl StatusHeartError {
    /// Whether this error is raised while turning the identity into call data.
    #[must_use]
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::InvalidIdentity { .. } | Self::Encoding(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
