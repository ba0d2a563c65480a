//! One-shot transfer of legacy search-index-only data into the primary
//! store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use atelier_core::error::AssetError;
use atelier_core::migration::MigrationState;
use atelier_core::record::{AssetKind, AssetRecord};
use atelier_core::types::{AssetId, Timestamp};
use atelier_search::SearchIndexer;
use atelier_store::{MigrationLedger, PrimaryStore};

/// Result of a migration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The ledger already records a successful run for this target.
    Skipped,
    Completed {
        migrated: u64,
    },
}

/// Idempotent, cursor-paginated transfer of assets that exist only in a
/// legacy search index into the primary store, tracked in the migration
/// ledger under the target table name.
///
/// A `Success` ledger entry short-circuits the run; `Failed` entries are
/// retried on the next attempt. Pagination is search-after over the
/// `(created_on, id)` sort key rather than offset-based, so deep pages
/// stay cheap and the scan does not drift under concurrent writes.
pub struct MigrationRunner<T: AssetKind> {
    indexer: Arc<dyn SearchIndexer>,
    store: Arc<dyn PrimaryStore<T>>,
    ledger: Arc<dyn MigrationLedger>,
    legacy_index: String,
    target: String,
    page_size: u32,
}

impl<T: AssetKind> MigrationRunner<T> {
    pub fn new(
        indexer: Arc<dyn SearchIndexer>,
        store: Arc<dyn PrimaryStore<T>>,
        ledger: Arc<dyn MigrationLedger>,
        legacy_index: impl Into<String>,
        target: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            indexer,
            store,
            ledger,
            legacy_index: legacy_index.into(),
            target: target.into(),
            page_size: page_size.max(1),
        }
    }

    /// Run the migration once, recording the outcome in the ledger.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
    ) -> Result<MigrationOutcome, AssetError> {
        if self.ledger.state_of(&self.target).await? == MigrationState::Success {
            info!(target = %self.target, "migration already completed, skipping");
            return Ok(MigrationOutcome::Skipped);
        }

        match self.transfer(cancel).await {
            Ok(migrated) => {
                self.ledger
                    .record(&self.target, MigrationState::Success)
                    .await?;
                info!(target = %self.target, migrated, "legacy migration completed");
                Ok(MigrationOutcome::Completed { migrated })
            }
            Err(err) => {
                self.ledger
                    .record(&self.target, MigrationState::Failed)
                    .await?;
                Err(AssetError::MigrationFailure {
                    target: self.target.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn transfer(&self, cancel: &CancellationToken) -> Result<u64, AssetError> {
        let mut cursor: Option<(Timestamp, AssetId)> = None;
        let mut migrated: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(AssetError::Cancelled);
            }
            let docs = self
                .indexer
                .search_after(&self.legacy_index, cursor, self.page_size)
                .await?;
            if docs.is_empty() {
                break;
            }

            let mut page_cursor = cursor;
            let mut batch = Vec::new();
            for doc in &docs {
                // Compound (created_on, id) key: the id tie-breaker keeps
                // groups of rows sharing one creation time from being
                // skipped when a tie group crosses a page boundary.
                if let Some(key) = cursor_key_of(doc) {
                    page_cursor = Some(page_cursor.map_or(key, |c| c.max(key)));
                }
                if doc.is_null() {
                    // Corrupt/partial write in the legacy store; skip the
                    // document, not the batch.
                    warn!(index = %self.legacy_index, "skipping null legacy document");
                    continue;
                }
                let record = match serde_json::from_value::<AssetRecord<T>>(doc.clone()) {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(index = %self.legacy_index, %err, "skipping undecodable legacy document");
                        continue;
                    }
                };
                // Legacy-only transfer: never overwrite a row the primary
                // store already owns.
                if !self.store.exists_non_deleted(record.id).await? {
                    batch.push(record);
                }
            }

            if !batch.is_empty() {
                migrated += batch.len() as u64;
                self.store.save_all(batch).await?;
            }

            if docs.len() < self.page_size as usize {
                break;
            }
            // Value equality, not identity: a stalled cursor on duplicate
            // sort keys must terminate the loop instead of repeating the
            // same page forever.
            if page_cursor == cursor {
                warn!(
                    index = %self.legacy_index,
                    "cursor did not advance, terminating migration scan"
                );
                break;
            }
            cursor = page_cursor;
        }

        Ok(migrated)
    }
}

fn cursor_key_of(doc: &Value) -> Option<(DateTime<Utc>, AssetId)> {
    let ts = doc
        .get("created_on")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))?;
    let id = doc
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<AssetId>().ok())?;
    Some((ts, id))
}
