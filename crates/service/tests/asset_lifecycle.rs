//! Integration tests for the asset CRUD contract against the in-memory
//! primary store:
//!
//! - Create/get round trip and id assignment
//! - Duplicate-id rejection for live records
//! - Soft delete hiding rows without destroying them
//! - Monotonic permanence enforcement
//! - Clone, export, and import semantics

use std::sync::Arc;

use assert_matches::assert_matches;
use serde::{Deserialize, Serialize};

use atelier_core::error::AssetError;
use atelier_core::record::{AssetKind, NewAsset};
use atelier_service::AssetService;
use atelier_store::MemoryStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Artwork {
    title: String,
}

impl AssetKind for Artwork {
    const KIND: &'static str = "artwork";
}

fn service() -> AssetService<Artwork> {
    AssetService::new(Arc::new(MemoryStore::new()), None, "atelier-artwork")
}

fn artwork(title: &str) -> NewAsset<Artwork> {
    NewAsset {
        id: None,
        temporary: false,
        public_asset: false,
        payload: Artwork {
            title: title.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Create / get
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_get_round_trips() {
    let svc = service();
    let created = svc.create(artwork("Nocturne")).await.unwrap();

    assert_eq!(created.payload.title, "Nocturne");
    assert_eq!(created.created_on, created.updated_on);
    assert!(created.deleted_on.is_none());

    let fetched = svc.get(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_assigns_distinct_ids() {
    let svc = service();
    let a = svc.create(artwork("a")).await.unwrap();
    let b = svc.create(artwork("b")).await.unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn create_with_live_duplicate_id_rejected() {
    let svc = service();
    let id = uuid::Uuid::now_v7();
    let mut input = artwork("first");
    input.id = Some(id);
    svc.create(input).await.unwrap();

    let mut dup = artwork("second");
    dup.id = Some(id);
    assert_matches!(
        svc.create(dup).await,
        Err(AssetError::AlreadyExists(got)) if got == id
    );
}

#[tokio::test]
async fn create_over_soft_deleted_id_is_allowed() {
    let svc = service();
    let id = uuid::Uuid::now_v7();
    let mut input = artwork("first");
    input.id = Some(id);
    svc.create(input).await.unwrap();
    svc.delete(id).await.unwrap();

    // Uniqueness only applies to live records.
    let mut again = artwork("second");
    again.id = Some(id);
    let recreated = svc.create(again).await.unwrap();
    assert_eq!(recreated.id, id);
    assert_eq!(recreated.payload.title, "second");
}

#[tokio::test]
async fn get_missing_is_none() {
    let svc = service();
    assert!(svc.get(uuid::Uuid::now_v7()).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Soft delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn soft_delete_hides_but_does_not_destroy() {
    let svc = service();
    let created = svc.create(artwork("ephemeral")).await.unwrap();

    svc.delete(created.id).await.unwrap();

    assert!(svc.get(created.id).await.unwrap().is_none());
    assert!(svc.list(0, 10).await.unwrap().is_empty());

    // The administrative path still sees the row.
    let raw = svc.get_any(created.id).await.unwrap().unwrap();
    assert!(raw.deleted_on.is_some());
    assert_eq!(raw.payload.title, "ephemeral");
}

#[tokio::test]
async fn delete_missing_or_deleted_is_not_found() {
    let svc = service();
    let created = svc.create(artwork("once")).await.unwrap();
    svc.delete(created.id).await.unwrap();

    assert_matches!(svc.delete(created.id).await, Err(AssetError::NotFound(_)));
    assert_matches!(
        svc.delete(uuid::Uuid::now_v7()).await,
        Err(AssetError::NotFound(_))
    );
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_requires_existing_live_record() {
    let svc = service();
    let mut record = svc.create(artwork("orphan")).await.unwrap();
    svc.delete(record.id).await.unwrap();

    record.payload.title = "renamed".to_string();
    assert_matches!(svc.update(record).await, Err(AssetError::NotFound(_)));
}

#[tokio::test]
async fn update_preserves_created_on_and_stamps_updated_on() {
    let svc = service();
    let created = svc.create(artwork("draft")).await.unwrap();

    let mut edit = created.clone();
    edit.payload.title = "final".to_string();
    let updated = svc.update(edit).await.unwrap();

    assert_eq!(updated.created_on, created.created_on);
    assert!(updated.updated_on > created.updated_on);
    assert_eq!(updated.payload.title, "final");
}

#[tokio::test]
async fn permanent_asset_cannot_become_temporary() {
    let svc = service();
    let created = svc.create(artwork("permanent")).await.unwrap();
    assert!(!created.temporary);

    let mut edit = created.clone();
    edit.temporary = true;
    edit.payload.title = "mutated".to_string();
    assert_matches!(
        svc.update(edit).await,
        Err(AssetError::IllegalStateTransition { .. })
    );

    // Rejected before any write: the stored record is unchanged.
    let stored = svc.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn temporary_asset_can_become_permanent() {
    let svc = service();
    let mut input = artwork("scratch");
    input.temporary = true;
    let created = svc.create(input).await.unwrap();

    let mut edit = created.clone();
    edit.temporary = false;
    let updated = svc.update(edit).await.unwrap();
    assert!(!updated.temporary);
}

// ---------------------------------------------------------------------------
// Clone
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clone_duplicates_payload_under_fresh_identity() {
    let svc = service();
    let source = svc.create(artwork("original")).await.unwrap();

    let copy = svc.clone_asset(source.id).await.unwrap();
    assert_ne!(copy.id, source.id);
    assert_eq!(copy.payload, source.payload);
    assert!(copy.created_on >= source.created_on);
}

#[tokio::test]
async fn clone_of_missing_or_deleted_is_not_found() {
    let svc = service();
    let source = svc.create(artwork("gone")).await.unwrap();
    svc.delete(source.id).await.unwrap();

    assert_matches!(
        svc.clone_asset(source.id).await,
        Err(AssetError::NotFound(_))
    );
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_import_crosses_store_boundaries() {
    let source_svc = service();
    let target_svc = service();

    let created = source_svc.create(artwork("travelling")).await.unwrap();
    let bytes = source_svc.export(created.id).await.unwrap();

    let imported = target_svc.import(&bytes).await.unwrap();
    assert_eq!(imported, created, "snapshot preserves id and timestamps");
    assert_eq!(
        target_svc.get(created.id).await.unwrap().unwrap().payload,
        created.payload
    );
}

#[tokio::test]
async fn import_collides_with_live_record() {
    let svc = service();
    let created = svc.create(artwork("resident")).await.unwrap();
    let bytes = svc.export(created.id).await.unwrap();

    assert_matches!(
        svc.import(&bytes).await,
        Err(AssetError::AlreadyExists(id)) if id == created.id
    );
}

#[tokio::test]
async fn import_rejects_malformed_snapshot() {
    let svc = service();
    assert_matches!(
        svc.import(b"not json at all").await,
        Err(AssetError::InvalidSnapshot(_))
    );
}

#[tokio::test]
async fn export_of_deleted_asset_is_not_found() {
    let svc = service();
    let created = svc.create(artwork("gone")).await.unwrap();
    svc.delete(created.id).await.unwrap();
    assert_matches!(svc.export(created.id).await, Err(AssetError::NotFound(_)));
}
