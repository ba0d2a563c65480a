//! Durability-side capability traits and backends.
//!
//! Defines the [`PrimaryStore`] contract every asset kind persists
//! through, plus the migration ledger and distributed lock used by
//! one-shot startup jobs. Two backends are provided: an in-memory store
//! for embedded use and tests, and a Postgres store in the repository
//! style of the rest of the stack.

pub mod ledger;
pub mod lock;
pub mod memory;
pub mod pg;
pub mod primary;

pub use ledger::MigrationLedger;
pub use lock::{DistributedLock, LockLease};
pub use memory::{MemoryLedger, MemoryLock, MemoryStore};
pub use primary::PrimaryStore;
