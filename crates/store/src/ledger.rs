//! Migration-ledger capability.

use async_trait::async_trait;
use atelier_core::error::AssetError;
use atelier_core::migration::MigrationState;

/// Persisted record of one-shot migration outcomes, keyed by target
/// table/collection name. Read once before a migration attempt and
/// written once after it.
#[async_trait]
pub trait MigrationLedger: Send + Sync {
    /// State of the ledger entry for `target`; `Unstarted` when no entry
    /// exists yet.
    async fn state_of(&self, target: &str) -> Result<MigrationState, AssetError>;

    /// Upsert the entry for `target` with the given state and a fresh
    /// timestamp.
    async fn record(&self, target: &str, state: MigrationState) -> Result<(), AssetError>;
}
