//! Pure domain layer for the asset persistence subsystem.
//!
//! Holds the shared record shape and lifecycle rules, the error taxonomy,
//! versioned index-name arithmetic, migration-ledger domain types, and the
//! immutable runtime configuration. This crate performs no I/O and has no
//! async code; everything here is deterministic and unit-testable.

pub mod config;
pub mod error;
pub mod index_name;
pub mod migration;
pub mod record;
pub mod types;
