//! Distributed lock capability for fleet-wide one-shot jobs.

use async_trait::async_trait;
use atelier_core::error::AssetError;

/// Proof of a held lock, passed back on release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    pub key: String,
}

/// Cross-process mutual exclusion with bounded lease semantics.
///
/// Acquisition failure is not an error: it means another instance owns
/// the job. Callers that want a bounded wait poll `try_acquire`.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Attempt to take the lock for `key`. Returns `None` when it is
    /// already held elsewhere.
    async fn try_acquire(&self, key: &str) -> Result<Option<LockLease>, AssetError>;

    /// Release a previously acquired lease. Releasing an expired or
    /// unknown lease is a no-op.
    async fn release(&self, lease: LockLease) -> Result<(), AssetError>;
}
