//! Domain types for the one-shot legacy-data migration ledger.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Outcome of a migration attempt, keyed by target table/collection name.
///
/// `Success` short-circuits later attempts; `Failed` is retried on the
/// next process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Unstarted,
    Success,
    Failed,
}

impl MigrationState {
    /// Return the state name as stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Parse a ledger state string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unstarted" => Some(Self::Unstarted),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row in the migration ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Target table/collection name the migration writes into.
    pub target: String,
    pub state: MigrationState,
    pub updated_on: Timestamp,
}
