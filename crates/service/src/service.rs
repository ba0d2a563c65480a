//! The asset CRUD contract used by all higher layers.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use atelier_core::error::AssetError;
use atelier_core::record::{check_permanence, AssetKind, AssetRecord, NewAsset};
use atelier_core::types::AssetId;
use atelier_search::SearchIndexer;
use atelier_store::PrimaryStore;

/// Orchestrates a [`PrimaryStore`] and an optional [`SearchIndexer`]:
/// enforces lifecycle invariants, stamps timestamps, and mirrors
/// indexable records into the search alias.
///
/// The primary store is authoritative; the index mirror is best-effort
/// and eventually consistent. Without an indexer the service is a plain
/// durable CRUD layer and `search` returns nothing.
pub struct AssetService<T: AssetKind> {
    store: Arc<dyn PrimaryStore<T>>,
    indexer: Option<Arc<dyn SearchIndexer>>,
    alias: String,
}

impl<T: AssetKind> AssetService<T> {
    pub fn new(
        store: Arc<dyn PrimaryStore<T>>,
        indexer: Option<Arc<dyn SearchIndexer>>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            store,
            indexer,
            alias: alias.into(),
        }
    }

    /// The alias this service mirrors indexable records into.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Create a new asset. Assigns an id when the input carries none and
    /// stamps both timestamps. Rejects a collision with a live record.
    pub async fn create(&self, input: NewAsset<T>) -> Result<AssetRecord<T>, AssetError> {
        if let Some(id) = input.id {
            if self.store.exists_non_deleted(id).await? {
                return Err(AssetError::AlreadyExists(id));
            }
        }
        let now = Utc::now();
        let record = AssetRecord {
            id: input.id.unwrap_or_else(uuid::Uuid::now_v7),
            created_on: now,
            updated_on: now,
            deleted_on: None,
            temporary: input.temporary,
            public_asset: input.public_asset,
            payload: input.payload,
        };
        let stored = self.store.save(record).await?;
        if stored.is_indexable() {
            self.mirror_insert(&stored).await?;
        }
        Ok(stored)
    }

    /// Read a live asset; soft-deleted records are treated as not found.
    pub async fn get(&self, id: AssetId) -> Result<Option<AssetRecord<T>>, AssetError> {
        Ok(self
            .store
            .get_by_id(id)
            .await?
            .filter(|r| !r.is_deleted()))
    }

    /// Administrative read that includes soft-deleted records.
    pub async fn get_any(&self, id: AssetId) -> Result<Option<AssetRecord<T>>, AssetError> {
        self.store.get_by_id(id).await
    }

    /// Primary-store-backed listing, deleted rows excluded. Full listing
    /// is a durability-store concern, so no indexability filter applies.
    pub async fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<AssetRecord<T>>, AssetError> {
        self.store.find_page(page, page_size, false).await
    }

    /// Search via the index alias. Returns only what was mirrored, which
    /// may lag the primary store. Documents that no longer decode are
    /// dropped from the result rather than failing the whole search.
    pub async fn search(
        &self,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> Result<Vec<AssetRecord<T>>, AssetError> {
        let Some(indexer) = &self.indexer else {
            debug!(alias = %self.alias, "search requested but no indexer is configured");
            return Ok(Vec::new());
        };
        let docs = indexer.search(&self.alias, page, page_size, query).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_value::<AssetRecord<T>>(doc) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(alias = %self.alias, %err, "dropping undecodable index document")
                }
            }
        }
        Ok(records)
    }

    /// Update an existing live asset.
    ///
    /// Inherently read-then-write: the pre-update record is loaded first
    /// so the old and new indexability values can be compared — the index
    /// action differs (insert vs. delete vs. re-index vs. no-op), which a
    /// re-derivation from the new record alone cannot express.
    /// Last-writer-wins under concurrent updates.
    pub async fn update(&self, asset: AssetRecord<T>) -> Result<AssetRecord<T>, AssetError> {
        let old = self
            .store
            .get_by_id(asset.id)
            .await?
            .filter(|r| !r.is_deleted())
            .ok_or(AssetError::NotFound(asset.id))?;
        check_permanence(&old, &asset)?;

        let record = AssetRecord {
            id: old.id,
            created_on: old.created_on,
            updated_on: Utc::now(),
            deleted_on: None,
            temporary: asset.temporary,
            public_asset: asset.public_asset,
            payload: asset.payload,
        };
        let stored = self.store.save(record).await?;

        match (old.is_indexable(), stored.is_indexable()) {
            (_, true) => self.mirror_insert(&stored).await?,
            (true, false) => self.mirror_delete(stored.id).await?,
            (false, false) => {}
        }
        Ok(stored)
    }

    /// Soft-delete an asset: stamps `deleted_on` and removes any mirrored
    /// document unconditionally. The row persists in the primary store.
    pub async fn delete(&self, id: AssetId) -> Result<(), AssetError> {
        let old = self
            .store
            .get_by_id(id)
            .await?
            .filter(|r| !r.is_deleted())
            .ok_or(AssetError::NotFound(id))?;

        let now = Utc::now();
        let record = AssetRecord {
            deleted_on: Some(now),
            updated_on: now,
            ..old
        };
        self.store.save(record).await?;
        self.mirror_delete(id).await?;
        Ok(())
    }

    /// Duplicate an asset's payload under a fresh id and fresh timestamps.
    pub async fn clone_asset(&self, id: AssetId) -> Result<AssetRecord<T>, AssetError> {
        let source = self.get(id).await?.ok_or(AssetError::NotFound(id))?;
        self.create(NewAsset {
            id: None,
            temporary: source.temporary,
            public_asset: source.public_asset,
            payload: source.payload,
        })
        .await
    }

    /// Serialize a full asset snapshot for crossing store boundaries.
    pub async fn export(&self, id: AssetId) -> Result<Vec<u8>, AssetError> {
        let record = self.get(id).await?.ok_or(AssetError::NotFound(id))?;
        serde_json::to_vec(&record).map_err(|e| AssetError::Backend(anyhow::Error::new(e)))
    }

    /// Re-create an asset from an exported snapshot, preserving the
    /// embedded id and timestamps. Collides with `AlreadyExists` when the
    /// id belongs to a live record; otherwise behaves like `create`,
    /// including the index mirror.
    pub async fn import(&self, bytes: &[u8]) -> Result<AssetRecord<T>, AssetError> {
        let record: AssetRecord<T> = serde_json::from_slice(bytes)
            .map_err(|e| AssetError::InvalidSnapshot(e.to_string()))?;
        if self.store.exists_non_deleted(record.id).await? {
            return Err(AssetError::AlreadyExists(record.id));
        }
        let stored = self.store.save(record).await?;
        if stored.is_indexable() {
            self.mirror_insert(&stored).await?;
        }
        Ok(stored)
    }

    async fn mirror_insert(&self, record: &AssetRecord<T>) -> Result<(), AssetError> {
        if let Some(indexer) = &self.indexer {
            let doc = serde_json::to_value(record)
                .map_err(|e| AssetError::Backend(anyhow::Error::new(e)))?;
            indexer.index_document(&self.alias, record.id, doc).await?;
        }
        Ok(())
    }

    async fn mirror_delete(&self, id: AssetId) -> Result<(), AssetError> {
        if let Some(indexer) = &self.indexer {
            indexer.delete_document(&self.alias, id).await?;
        }
        Ok(())
    }
}
