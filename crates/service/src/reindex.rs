//! Blue/green index rotation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use atelier_core::error::AssetError;
use atelier_core::index_name;
use atelier_core::record::AssetKind;
use atelier_search::SearchIndexer;
use atelier_store::PrimaryStore;

/// Outcome of a completed reindex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexReport {
    pub old_index: String,
    pub new_index: String,
    pub documents_copied: u64,
    pub old_index_dropped: bool,
}

/// Rebuilds the search index for one asset kind behind its alias with no
/// read downtime: a new versioned index is populated from the primary
/// store, then the alias is repointed atomically.
///
/// Failure before the swap leaves the alias untouched; the abandoned
/// partial index is safe to delete and re-create on the next attempt.
/// The swap itself is the single call that can require manual attention
/// if it fails.
pub struct IndexVersionManager<T: AssetKind> {
    store: Arc<dyn PrimaryStore<T>>,
    indexer: Arc<dyn SearchIndexer>,
    alias: String,
    batch_size: u32,
}

impl<T: AssetKind> IndexVersionManager<T> {
    pub fn new(
        store: Arc<dyn PrimaryStore<T>>,
        indexer: Arc<dyn SearchIndexer>,
        alias: impl Into<String>,
        batch_size: u32,
    ) -> Self {
        Self {
            store,
            indexer,
            alias: alias.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// Startup bootstrap: make sure the alias exists, creating an empty
    /// `-v1.0` index behind it when absent. Returns the physical index
    /// name the alias points at.
    pub async fn ensure_alias(&self) -> Result<String, AssetError> {
        if let Some(current) = self.indexer.resolve_alias(&self.alias).await? {
            return Ok(current);
        }
        let initial = index_name::initial(&self.alias);
        if !self.indexer.index_exists(&initial).await? {
            self.indexer.create_index(&initial).await?;
        }
        self.indexer.create_alias(&initial, &self.alias).await?;
        info!(alias = %self.alias, index = %initial, "bootstrapped search alias");
        Ok(initial)
    }

    /// Rebuild the index and swap the alias.
    ///
    /// `drop_old` controls whether the superseded index is deleted after
    /// the swap; the default posture is to keep it for rollback.
    /// Cancellation before the swap returns [`AssetError::Cancelled`]
    /// with the alias still pointing at the old index.
    pub async fn reindex(
        &self,
        drop_old: bool,
        cancel: &CancellationToken,
    ) -> Result<ReindexReport, AssetError> {
        let current = self.ensure_alias().await?;
        let next = index_name::next_version(&current);

        // A populated target is leftover state from an interrupted
        // rotation; never merge into it.
        if self.indexer.index_exists(&next).await? && self.indexer.count(&next).await? > 0 {
            return Err(AssetError::IndexNotReady(next));
        }
        if !self.indexer.index_exists(&next).await? {
            self.indexer.create_index(&next).await?;
        }

        let mut copied: u64 = 0;
        let mut page: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(AssetError::Cancelled);
            }
            let rows = self
                .store
                .find_page(page, self.batch_size, false)
                .await?;
            let row_count = rows.len();
            if row_count == 0 {
                break;
            }

            let mut batch = Vec::new();
            for record in rows.iter().filter(|r| r.is_indexable()) {
                let doc = serde_json::to_value(record)
                    .map_err(|e| AssetError::Backend(anyhow::Error::new(e)))?;
                batch.push((record.id, doc));
            }
            if !batch.is_empty() {
                copied += batch.len() as u64;
                self.indexer.bulk_index(&next, batch).await?;
            }

            if row_count < self.batch_size as usize {
                break;
            }
            page += 1;
        }

        self.indexer.refresh(&next).await?;

        if cancel.is_cancelled() {
            return Err(AssetError::Cancelled);
        }
        self.indexer.swap_alias(&self.alias, &current, &next).await?;
        info!(
            alias = %self.alias,
            old = %current,
            new = %next,
            copied,
            "swapped search alias to rebuilt index"
        );

        let mut dropped = false;
        if drop_old {
            self.indexer.delete_index(&current).await?;
            dropped = true;
        }

        Ok(ReindexReport {
            old_index: current,
            new_index: next,
            documents_copied: copied,
            old_index_dropped: dropped,
        })
    }
}
