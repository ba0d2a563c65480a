//! In-memory [`SearchIndexer`] for embedded deployments and tests.
//!
//! Query semantics are a deliberate stand-in for a real engine:
//! case-insensitive substring matching over the serialized document, no
//! ranking. Ordering, alias indirection, cursor pagination, and the
//! atomic swap contract match what the orchestration layer relies on.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use atelier_core::error::AssetError;
use atelier_core::types::{AssetId, Timestamp};

use crate::indexer::SearchIndexer;

#[derive(Debug, Default)]
struct Inner {
    /// Physical index name -> documents by id.
    indices: HashMap<String, HashMap<AssetId, Value>>,
    /// Alias -> physical index name.
    aliases: HashMap<String, String>,
}

impl Inner {
    /// Resolve an alias to its physical name; a non-alias name passes
    /// through unchanged.
    fn physical(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Map-backed indexer. Writes are visible immediately; `refresh` is a
/// no-op kept for contract parity with engines that buffer writes.
#[derive(Debug, Default)]
pub struct MemoryIndexer {
    inner: RwLock<Inner>,
}

impl MemoryIndexer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sort key for deterministic result ordering: `(created_on, id)`.
/// Documents without a parseable `created_on` (corrupt/partial writes)
/// sort first so they surface early during cursor scans.
fn sort_key(id: &AssetId, doc: &Value) -> (Option<DateTime<Utc>>, AssetId) {
    (created_on_of(doc), *id)
}

fn created_on_of(doc: &Value) -> Option<DateTime<Utc>> {
    doc.get("created_on")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn matches_query(doc: &Value, query: Option<&str>) -> bool {
    match query {
        None => true,
        Some(q) => doc.to_string().to_lowercase().contains(&q.to_lowercase()),
    }
}

fn ordered_docs(docs: &HashMap<AssetId, Value>) -> Vec<(AssetId, Value)> {
    let mut all: Vec<(AssetId, Value)> =
        docs.iter().map(|(id, doc)| (*id, doc.clone())).collect();
    all.sort_by(|(a_id, a), (b_id, b)| sort_key(a_id, a).cmp(&sort_key(b_id, b)));
    all
}

#[async_trait]
impl SearchIndexer for MemoryIndexer {
    async fn index_document(
        &self,
        index: &str,
        id: AssetId,
        doc: Value,
    ) -> Result<(), AssetError> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        let physical = inner.physical(index);
        inner.indices.entry(physical).or_default().insert(id, doc);
        Ok(())
    }

    async fn get_document(
        &self,
        index: &str,
        id: AssetId,
    ) -> Result<Option<Value>, AssetError> {
        let inner = self.inner.read().expect("index lock poisoned");
        let physical = inner.physical(index);
        Ok(inner
            .indices
            .get(&physical)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn delete_document(&self, index: &str, id: AssetId) -> Result<(), AssetError> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        let physical = inner.physical(index);
        if let Some(docs) = inner.indices.get_mut(&physical) {
            docs.remove(&id);
        }
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> Result<Vec<Value>, AssetError> {
        let inner = self.inner.read().expect("index lock poisoned");
        let physical = inner.physical(index);
        let Some(docs) = inner.indices.get(&physical) else {
            return Ok(Vec::new());
        };
        let start = (page as usize).saturating_mul(page_size as usize);
        Ok(ordered_docs(docs)
            .into_iter()
            .map(|(_, doc)| doc)
            .filter(|doc| matches_query(doc, query))
            .skip(start)
            .take(page_size as usize)
            .collect())
    }

    async fn search_after(
        &self,
        index: &str,
        after: Option<(Timestamp, AssetId)>,
        size: u32,
    ) -> Result<Vec<Value>, AssetError> {
        let inner = self.inner.read().expect("index lock poisoned");
        let physical = inner.physical(index);
        let Some(docs) = inner.indices.get(&physical) else {
            return Ok(Vec::new());
        };
        Ok(ordered_docs(docs)
            .into_iter()
            .filter(|(id, doc)| match after {
                None => true,
                Some((ts, cursor_id)) => sort_key(id, doc) > (Some(ts), cursor_id),
            })
            .map(|(_, doc)| doc)
            .take(size as usize)
            .collect())
    }

    async fn count(&self, index: &str) -> Result<i64, AssetError> {
        let inner = self.inner.read().expect("index lock poisoned");
        let physical = inner.physical(index);
        Ok(inner
            .indices
            .get(&physical)
            .map(|docs| docs.len() as i64)
            .unwrap_or(0))
    }

    async fn index_exists(&self, name: &str) -> Result<bool, AssetError> {
        let inner = self.inner.read().expect("index lock poisoned");
        Ok(inner.indices.contains_key(name))
    }

    async fn create_index(&self, name: &str) -> Result<(), AssetError> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        inner.indices.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), AssetError> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        inner.indices.remove(name);
        inner.aliases.retain(|_, target| target != name);
        Ok(())
    }

    async fn create_alias(&self, index: &str, alias: &str) -> Result<(), AssetError> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        inner.aliases.insert(alias.to_string(), index.to_string());
        Ok(())
    }

    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>, AssetError> {
        let inner = self.inner.read().expect("index lock poisoned");
        Ok(inner.aliases.get(alias).cloned())
    }

    async fn swap_alias(&self, alias: &str, old: &str, new: &str) -> Result<(), AssetError> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        match inner.aliases.get(alias) {
            Some(current) if current == old => {
                inner.aliases.insert(alias.to_string(), new.to_string());
                Ok(())
            }
            Some(current) => Err(AssetError::Backend(anyhow::anyhow!(
                "alias '{alias}' points at '{current}', expected '{old}'"
            ))),
            None => Err(AssetError::Backend(anyhow::anyhow!(
                "alias '{alias}' does not exist"
            ))),
        }
    }

    async fn bulk_index(
        &self,
        index: &str,
        docs: Vec<(AssetId, Value)>,
    ) -> Result<(), AssetError> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        let physical = inner.physical(index);
        let target = inner.indices.entry(physical).or_default();
        for (id, doc) in docs {
            target.insert(id, doc);
        }
        Ok(())
    }

    async fn refresh(&self, _index: &str) -> Result<(), AssetError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(created_on: &str, name: &str) -> Value {
        json!({ "created_on": created_on, "payload": { "name": name } })
    }

    fn id() -> AssetId {
        uuid::Uuid::now_v7()
    }

    #[tokio::test]
    async fn index_then_get_round_trips() {
        let idx = MemoryIndexer::new();
        let a = id();
        let d = doc("2024-01-01T00:00:00Z", "alpha");
        idx.index_document("assets", a, d.clone()).await.unwrap();
        assert_eq!(idx.get_document("assets", a).await.unwrap(), Some(d));
    }

    #[tokio::test]
    async fn alias_routes_reads_and_writes() {
        let idx = MemoryIndexer::new();
        idx.create_index("assets-v1.0").await.unwrap();
        idx.create_alias("assets-v1.0", "assets").await.unwrap();

        let a = id();
        idx.index_document("assets", a, doc("2024-01-01T00:00:00Z", "alpha"))
            .await
            .unwrap();
        assert!(idx.get_document("assets-v1.0", a).await.unwrap().is_some());
        assert_eq!(idx.count("assets").await.unwrap(), 1);
        assert_eq!(
            idx.resolve_alias("assets").await.unwrap().as_deref(),
            Some("assets-v1.0")
        );
    }

    #[tokio::test]
    async fn search_orders_by_creation_time_and_paginates() {
        let idx = MemoryIndexer::new();
        idx.index_document("assets", id(), doc("2024-01-03T00:00:00Z", "third"))
            .await
            .unwrap();
        idx.index_document("assets", id(), doc("2024-01-01T00:00:00Z", "first"))
            .await
            .unwrap();
        idx.index_document("assets", id(), doc("2024-01-02T00:00:00Z", "second"))
            .await
            .unwrap();

        let all = idx.search("assets", 0, 10, None).await.unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|d| d["payload"]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);

        let second_page = idx.search("assets", 1, 2, None).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0]["payload"]["name"], "third");
    }

    #[tokio::test]
    async fn query_is_substring_case_insensitive() {
        let idx = MemoryIndexer::new();
        idx.index_document("assets", id(), doc("2024-01-01T00:00:00Z", "Blue Model"))
            .await
            .unwrap();
        idx.index_document("assets", id(), doc("2024-01-02T00:00:00Z", "green scene"))
            .await
            .unwrap();

        assert_eq!(idx.search("assets", 0, 10, Some("blue")).await.unwrap().len(), 1);
        assert_eq!(idx.search("assets", 0, 10, Some("MODEL")).await.unwrap().len(), 1);
        assert_eq!(idx.search("assets", 0, 10, Some("purple")).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn search_after_advances_past_cursor() {
        let idx = MemoryIndexer::new();
        let mut ids = Vec::new();
        for (ts, name) in [
            ("2024-01-01T00:00:00Z", "a"),
            ("2024-01-02T00:00:00Z", "b"),
            ("2024-01-03T00:00:00Z", "c"),
        ] {
            let doc_id = id();
            ids.push(doc_id);
            idx.index_document("assets", doc_id, doc(ts, name)).await.unwrap();
        }

        let first = idx.search_after("assets", None, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        let cursor = (created_on_of(&first[1]).unwrap(), ids[1]);

        let rest = idx.search_after("assets", Some(cursor), 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["payload"]["name"], "c");
    }

    #[tokio::test]
    async fn search_after_splits_creation_time_ties_across_pages() {
        let idx = MemoryIndexer::new();
        let shared = "2024-01-01T00:00:00Z";
        let mut ids: Vec<AssetId> = (0..4).map(|_| id()).collect();
        ids.sort();
        for (i, doc_id) in ids.iter().enumerate() {
            idx.index_document("assets", *doc_id, doc(shared, &format!("tied-{i}")))
                .await
                .unwrap();
        }

        let ts = created_on_of(&doc(shared, "")).unwrap();
        let first = idx.search_after("assets", None, 2).await.unwrap();
        assert_eq!(first.len(), 2);

        // The id tie-breaker must carry the scan past the shared
        // timestamp instead of re-serving or dropping the tie group.
        let rest = idx.search_after("assets", Some((ts, ids[1])), 10).await.unwrap();
        let names: Vec<_> = rest
            .iter()
            .map(|d| d["payload"]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["tied-2", "tied-3"]);
    }

    #[tokio::test]
    async fn delete_document_is_idempotent() {
        let idx = MemoryIndexer::new();
        let a = id();
        idx.index_document("assets", a, doc("2024-01-01T00:00:00Z", "x"))
            .await
            .unwrap();
        idx.delete_document("assets", a).await.unwrap();
        idx.delete_document("assets", a).await.unwrap();
        assert_eq!(idx.count("assets").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn swap_alias_requires_expected_old_index() {
        let idx = MemoryIndexer::new();
        idx.create_index("assets-v1.0").await.unwrap();
        idx.create_index("assets-v1.1").await.unwrap();
        idx.create_alias("assets-v1.0", "assets").await.unwrap();

        assert!(idx
            .swap_alias("assets", "assets-v0.9", "assets-v1.1")
            .await
            .is_err());
        idx.swap_alias("assets", "assets-v1.0", "assets-v1.1")
            .await
            .unwrap();
        assert_eq!(
            idx.resolve_alias("assets").await.unwrap().as_deref(),
            Some("assets-v1.1")
        );
    }

    #[tokio::test]
    async fn delete_index_drops_documents_and_aliases() {
        let idx = MemoryIndexer::new();
        idx.create_index("assets-v1.0").await.unwrap();
        idx.create_alias("assets-v1.0", "assets").await.unwrap();
        idx.index_document("assets", id(), doc("2024-01-01T00:00:00Z", "x"))
            .await
            .unwrap();

        idx.delete_index("assets-v1.0").await.unwrap();
        assert!(!idx.index_exists("assets-v1.0").await.unwrap());
        assert_eq!(idx.resolve_alias("assets").await.unwrap(), None);
    }

    #[tokio::test]
    async fn bulk_index_inserts_all() {
        let idx = MemoryIndexer::new();
        let docs: Vec<_> = (1..=5)
            .map(|i| (id(), doc(&format!("2024-01-0{i}T00:00:00Z"), "bulk")))
            .collect();
        idx.bulk_index("assets", docs).await.unwrap();
        idx.refresh("assets").await.unwrap();
        assert_eq!(idx.count("assets").await.unwrap(), 5);
    }
}
