//! Orchestration layer: asset CRUD over the primary store with
//! conditional search-index mirroring, blue/green index rotation, and
//! one-shot legacy migrations.
//!
//! Consistency model: a primary-store write and its index mirror are two
//! separate calls on the caller's task. A crash between them leaves the
//! stores transiently inconsistent; that window is accepted and closed by
//! the next write or a reindex, not by distributed transactions.

pub mod bootstrap;
pub mod migration;
pub mod registry;
pub mod reindex;
pub mod service;

pub use migration::{MigrationOutcome, MigrationRunner};
pub use registry::ServiceRegistry;
pub use reindex::{IndexVersionManager, ReindexReport};
pub use service::AssetService;
