//! # Report Builder
//!
//! Turns a [`SignedIdentity`] snapshot into `reportStatus` call data.
//!
//! The builder answers `None` while the identity is not established yet
//! (empty peer id). The encoder is not consulted in that case. Malformed
//! hex in the address or signature aborts the build with an error; the
//! next snapshot gets a fresh attempt.

use crate::contract::{CallEncoder, StatusHeartCall, genHashExtCall, reportStatusCall};
use crate::types::{SignedIdentity, StatusHeartError};
use alloy_primitives::{Address, Bytes, hex};

/// Builds encoded heartbeat payloads through a [`CallEncoder`].
pub struct ReportBuilder<'a> {
    encoder: &'a dyn CallEncoder,
}

impl<'a> ReportBuilder<'a> {
    /// Create a builder that encodes with `encoder`.
    #[must_use]
    pub fn new(encoder: &'a dyn CallEncoder) -> Self {
        Self { encoder }
    }

    /// Encode the heartbeat for `identity`, or `None` if there is nothing
    /// to report yet.
    pub fn build(&self, identity: &SignedIdentity) -> Result<Option<Bytes>, StatusHeartError> {
        match report_call(identity)? {
            Some(call) => self.encoder.encode(&call).map(Some),
            None => Ok(None),
        }
    }

    /// Encode the read-only `genHashExt` query for `identity`.
    ///
    /// Unlike [`build`](Self::build) this does not require a signature and
    /// fails if the identity is not established.
    pub fn build_hash_ext(&self, identity: &SignedIdentity) -> Result<Bytes, StatusHeartError> {
        if !identity.is_established() {
            return Err(StatusHeartError::InvalidIdentity {
                field: "peer_id",
                reason: "identity not established".to_string(),
            });
        }
        let call = StatusHeartCall::genHashExt(genHashExtCall {
            peer: identity.peer_id.clone(),
            createTime: identity.created_time,
            version: identity.version.clone(),
            num: identity.nonce,
            bttcAddress: parse_chain_address(&identity.chain_address)?,
        });
        self.encoder.encode(&call)
    }
}

/// Typed `reportStatus` call for `identity`, `None` while it is not established.
pub fn report_call(identity: &SignedIdentity) -> Result<Option<StatusHeartCall>, StatusHeartError> {
    if !identity.is_established() {
        return Ok(None);
    }

    Ok(Some(StatusHeartCall::reportStatus(reportStatusCall {
        peer: identity.peer_id.clone(),
        createTime: identity.created_time,
        version: identity.version.clone(),
        num: identity.nonce,
        bttcAddress: parse_chain_address(&identity.chain_address)?,
        signedTime: identity.signed_time,
        signature: parse_signature(&identity.signature)?,
    })))
}

/// Parse the node's ledger account from 0x-hex.
pub fn parse_chain_address(raw: &str) -> Result<Address, StatusHeartError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StatusHeartError::InvalidIdentity {
            field: "chain_address",
            reason: "missing".to_string(),
        });
    }
    trimmed
        .parse::<Address>()
        .map_err(|e| StatusHeartError::InvalidIdentity {
            field: "chain_address",
            reason: e.to_string(),
        })
}

/// Decode the signature from hex; the `0x` prefix is optional.
pub fn parse_signature(raw: &str) -> Result<Bytes, StatusHeartError> {
    hex::decode(raw.trim())
        .map(Bytes::from)
        .map_err(|e| StatusHeartError::InvalidIdentity {
            field: "signature",
            reason: e.to_string(),
        })
}

// =============================================================================
// TESTS
// =============================================================================
