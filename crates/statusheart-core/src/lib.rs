//! # statusheart-core
//!
//! The reporting logic of the status heart agent - THE LOGIC.
//!
//! The agent periodically announces the node's liveness and signed
//! identity to the status heart registry contract. This crate holds the
//! synchronous half of that job:
//!
//! - `types` - signed identity, report task, gateway shapes, errors
//! - `contract` - the registry's calling convention and the call encoder
//! - `builder` - identity snapshot → `reportStatus` call data
//! - `identity` - the shared identity store the signer publishes into
//!
//! Submission, confirmation and scheduling live in the `statusheart` app,
//! which is the only async/network-aware component.

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod contract;
pub mod identity;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use alloy_primitives::{Address, B256, Bytes, U256};

pub use builder::{ReportBuilder, parse_chain_address, parse_signature, report_call};
pub use contract::{
    AbiCallEncoder, CallEncoder, REPORT_DESCRIPTION, STATUS_HEART_ADDRESS, SolCall,
    StatusHeartCall, decode_hash_ext, genHashExtCall, reportStatusCall,
};
pub use identity::{IdentityStore, SharedIdentity};
pub use types::{ReportTask, SignedIdentity, StatusHeartError, TxHash, TxReceipt, TxRequest};
