//! The search-index capability contract.

use async_trait::async_trait;
use serde_json::Value;

use atelier_core::error::AssetError;
use atelier_core::types::{AssetId, Timestamp};

/// Document index/get/delete/search against a named index or alias.
///
/// Contract notes:
/// - Every `index` argument may be a physical index name or an alias;
///   implementations resolve aliases first.
/// - `search` and `search_after` order results by `(created_on, id)`
///   ascending; `search_after` is the cursor form used by migrations to
///   avoid deep-offset cost and drift under concurrent writes.
/// - `swap_alias` repoints atomically and fails when the alias does not
///   currently point at `old`.
/// - `refresh` makes recent writes visible to subsequent searches; it is
///   called synchronously after bulk operations to keep migration and
///   test flows deterministic.
/// - `delete_document` is idempotent.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    async fn index_document(
        &self,
        index: &str,
        id: AssetId,
        doc: Value,
    ) -> Result<(), AssetError>;

    async fn get_document(&self, index: &str, id: AssetId)
        -> Result<Option<Value>, AssetError>;

    async fn delete_document(&self, index: &str, id: AssetId) -> Result<(), AssetError>;

    async fn search(
        &self,
        index: &str,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> Result<Vec<Value>, AssetError>;

    /// Cursor pagination: documents whose `(created_on, id)` sort key is
    /// strictly greater than `after`, up to `size`. The cursor carries
    /// the id as a tie-breaker so groups of documents sharing one
    /// creation time paginate losslessly across page boundaries.
    async fn search_after(
        &self,
        index: &str,
        after: Option<(Timestamp, AssetId)>,
        size: u32,
    ) -> Result<Vec<Value>, AssetError>;

    async fn count(&self, index: &str) -> Result<i64, AssetError>;

    async fn index_exists(&self, name: &str) -> Result<bool, AssetError>;

    async fn create_index(&self, name: &str) -> Result<(), AssetError>;

    async fn delete_index(&self, name: &str) -> Result<(), AssetError>;

    async fn create_alias(&self, index: &str, alias: &str) -> Result<(), AssetError>;

    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>, AssetError>;

    async fn swap_alias(&self, alias: &str, old: &str, new: &str) -> Result<(), AssetError>;

    async fn bulk_index(
        &self,
        index: &str,
        docs: Vec<(AssetId, Value)>,
    ) -> Result<(), AssetError>;

    async fn refresh(&self, index: &str) -> Result<(), AssetError>;
}
