//! The canonical record-store capability.

use async_trait::async_trait;
use atelier_core::error::AssetError;
use atelier_core::record::AssetRecord;
use atelier_core::types::AssetId;

/// ID-keyed CRUD with soft delete, stable pagination, and bulk insert.
///
/// Contract:
/// - `save` applies a record atomically (insert-or-replace by id, never
///   partial).
/// - `find_page` orders by `(created_on, id)` ascending, so repeated
///   pagination with stable parameters yields a stable total ordering.
///   Migration correctness depends on this.
/// - `get_by_id` returns soft-deleted rows too; normal-access filtering
///   is the service layer's job, and administrative/migration paths rely
///   on seeing deleted rows.
#[async_trait]
pub trait PrimaryStore<T>: Send + Sync {
    async fn get_by_id(&self, id: AssetId) -> Result<Option<AssetRecord<T>>, AssetError>;

    async fn find_page(
        &self,
        page: u32,
        page_size: u32,
        include_deleted: bool,
    ) -> Result<Vec<AssetRecord<T>>, AssetError>;

    async fn save(&self, record: AssetRecord<T>) -> Result<AssetRecord<T>, AssetError>;

    async fn save_all(
        &self,
        records: Vec<AssetRecord<T>>,
    ) -> Result<Vec<AssetRecord<T>>, AssetError>;

    /// `true` iff a record with this id exists and is not soft-deleted.
    async fn exists_non_deleted(&self, id: AssetId) -> Result<bool, AssetError>;
}
