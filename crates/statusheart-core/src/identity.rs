//! # Signed Identity Store
//!
//! Read access to the node's signed identity. The signer owns the value
//! and replaces it wholesale; readers always get a full snapshot, never a
//! half-updated record.

use crate::types::SignedIdentity;
use std::sync::{Arc, RwLock};

/// Source of the current [`SignedIdentity`].
pub trait IdentityStore: Send + Sync {
    /// Consistent snapshot of the identity as of now.
    ///
    /// May be empty (default) before the node finished onboarding.
    fn read(&self) -> SignedIdentity;
}

/// Process-wide identity cell shared between the signer and the reporter.
///
/// Cloning shares the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct SharedIdentity {
    inner: Arc<RwLock<SignedIdentity>>,
}

impl SharedIdentity {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `identity`.
    #[must_use]
    pub fn with_identity(identity: SignedIdentity) -> Self {
        Self {
            inner: Arc::new(RwLock::new(identity)),
        }
    }

    /// Replace the identity. Returns `true` if the value changed.
    pub fn publish(&self, identity: SignedIdentity) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if *guard == identity {
            return false;
        }
        *guard = identity;
        true
    }
}

impl IdentityStore for SharedIdentity {
    fn read(&self) -> SignedIdentity {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================
