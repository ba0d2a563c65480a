//! In-memory backends for embedded deployments and tests.
//!
//! Semantics match the Postgres backends: stable `(created_on, id)`
//! pagination order, insert-or-replace saves, lease-bounded locks.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use atelier_core::error::AssetError;
use atelier_core::migration::{LedgerEntry, MigrationState};
use atelier_core::record::AssetRecord;
use atelier_core::types::AssetId;

use crate::ledger::MigrationLedger;
use crate::lock::{DistributedLock, LockLease};
use crate::primary::PrimaryStore;

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Map-backed [`PrimaryStore`].
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    rows: RwLock<HashMap<AssetId, AssetRecord<T>>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Total row count including soft-deleted rows.
    pub fn len(&self) -> usize {
        self.rows.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<T> PrimaryStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get_by_id(&self, id: AssetId) -> Result<Option<AssetRecord<T>>, AssetError> {
        let rows = self.rows.read().expect("store lock poisoned");
        Ok(rows.get(&id).cloned())
    }

    async fn find_page(
        &self,
        page: u32,
        page_size: u32,
        include_deleted: bool,
    ) -> Result<Vec<AssetRecord<T>>, AssetError> {
        let rows = self.rows.read().expect("store lock poisoned");
        let mut all: Vec<AssetRecord<T>> = rows
            .values()
            .filter(|r| include_deleted || r.deleted_on.is_none())
            .cloned()
            .collect();
        all.sort_by(|a, b| (a.created_on, a.id).cmp(&(b.created_on, b.id)));
        let start = (page as usize).saturating_mul(page_size as usize);
        Ok(all
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect())
    }

    async fn save(&self, record: AssetRecord<T>) -> Result<AssetRecord<T>, AssetError> {
        let mut rows = self.rows.write().expect("store lock poisoned");
        rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn save_all(
        &self,
        records: Vec<AssetRecord<T>>,
    ) -> Result<Vec<AssetRecord<T>>, AssetError> {
        let mut rows = self.rows.write().expect("store lock poisoned");
        for record in &records {
            rows.insert(record.id, record.clone());
        }
        Ok(records)
    }

    async fn exists_non_deleted(&self, id: AssetId) -> Result<bool, AssetError> {
        let rows = self.rows.read().expect("store lock poisoned");
        Ok(rows.get(&id).is_some_and(|r| r.deleted_on.is_none()))
    }
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// Map-backed [`MigrationLedger`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<HashMap<String, LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entry for `target`, if any.
    pub fn entry(&self, target: &str) -> Option<LedgerEntry> {
        self.entries
            .read()
            .expect("ledger lock poisoned")
            .get(target)
            .cloned()
    }
}

#[async_trait]
impl MigrationLedger for MemoryLedger {
    async fn state_of(&self, target: &str) -> Result<MigrationState, AssetError> {
        let entries = self.entries.read().expect("ledger lock poisoned");
        Ok(entries
            .get(target)
            .map(|e| e.state)
            .unwrap_or(MigrationState::Unstarted))
    }

    async fn record(&self, target: &str, state: MigrationState) -> Result<(), AssetError> {
        let mut entries = self.entries.write().expect("ledger lock poisoned");
        entries.insert(
            target.to_string(),
            LedgerEntry {
                target: target.to_string(),
                state,
                updated_on: Utc::now(),
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryLock
// ---------------------------------------------------------------------------

/// In-process [`DistributedLock`] with lease expiry.
///
/// Suitable for single-process deployments and tests; the lease bound
/// mirrors the advisory-lock behaviour of the Postgres implementation.
#[derive(Debug)]
pub struct MemoryLock {
    lease: Duration,
    held: Mutex<HashMap<String, Instant>>,
}

impl MemoryLock {
    pub fn new(lease: Duration) -> Self {
        Self {
            lease,
            held: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl DistributedLock for MemoryLock {
    async fn try_acquire(&self, key: &str) -> Result<Option<LockLease>, AssetError> {
        let mut held = self.held.lock().expect("lock table poisoned");
        if let Some(taken_at) = held.get(key) {
            if taken_at.elapsed() < self.lease {
                return Ok(None);
            }
        }
        held.insert(key.to_string(), Instant::now());
        Ok(Some(LockLease {
            key: key.to_string(),
        }))
    }

    async fn release(&self, lease: LockLease) -> Result<(), AssetError> {
        let mut held = self.held.lock().expect("lock table poisoned");
        held.remove(&lease.key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
