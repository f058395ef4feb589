//! # Status Heart Contract Interface
//!
//! The fixed calling convention of the status heart registry contract and
//! the [`CallEncoder`] seam that turns a typed call into call data.
//!
//! ## Operations
//!
//! - `reportStatus(string,uint32,string,uint32,address,uint32,bytes)` - the heartbeat
//! - `genHashExt(string,uint32,string,uint32,address)` - read-only view returning
//!   the digest the contract expects the signer to have signed

use crate::types::StatusHeartError;
use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::{SolInterface, sol};

pub use alloy_sol_types::SolCall;

/// Registry contract the heartbeat is reported to.
pub const STATUS_HEART_ADDRESS: &str = "0xE42016a68511BFfdcE74E04DD35DCD7bf75582c8";

/// Description attached to every heartbeat transaction.
pub const REPORT_DESCRIPTION: &str = "Report Heart Status";

sol! {
    #[sol(all_derives)]
    interface IStatusHeart {
        function reportStatus(
            string peer,
            uint32 createTime,
            string version,
            uint32 num,
            address bttcAddress,
            uint32 signedTime,
            bytes signature
        ) external;

        function genHashExt(
            string peer,
            uint32 createTime,
            string version,
            uint32 num,
            address bttcAddress
        ) external view returns (bytes32);
    }
}

pub use IStatusHeart::{IStatusHeartCalls as StatusHeartCall, genHashExtCall, reportStatusCall};

impl StatusHeartCall {
    /// Contract-level name of the operation.
    #[must_use]
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::reportStatus(_) => "reportStatus",
            Self::genHashExt(_) => "genHashExt",
        }
    }
}

// =============================================================================
// CALL ENCODER
// =============================================================================

/// Encodes a typed contract call into the bytes a transaction carries.
pub trait CallEncoder: Send + Sync {
    /// Encode `call` as call data (selector followed by ABI arguments).
    fn encode(&self, call: &StatusHeartCall) -> Result<Bytes, StatusHeartError>;
}

/// Standard Solidity ABI encoder for [`IStatusHeart`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiCallEncoder;

impl CallEncoder for AbiCallEncoder {
    fn encode(&self, call: &StatusHeartCall) -> Result<Bytes, StatusHeartError> {
        Ok(Bytes::from(call.abi_encode()))
    }
}

/// Extract the `bytes32` digest returned by `genHashExt`.
pub fn decode_hash_ext(result: &[u8]) -> Result<B256, StatusHeartError> {
    result
        .get(..32)
        .map(B256::from_slice)
        .ok_or_else(|| {
            StatusHeartError::Query(format!(
                "genHashExt returned {} bytes, expected 32",
                result.len()
            ))
        })
}

// =============================================================================
// TESTS
// =============================================================================
