use crate::types::AssetId;

/// Error taxonomy for the persistence and index-synchronization layer.
///
/// Domain rejections (`NotFound`, `AlreadyExists`, `IllegalStateTransition`,
/// `IndexNotReady`, `InvalidSnapshot`) are detected locally before any write.
/// Transient backend failures pass through the `Backend` variant unchanged so
/// callers can tell a bad request from a storage outage; this layer performs
/// no retry or backoff of its own.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(AssetId),

    #[error("Asset already exists: {0}")]
    AlreadyExists(AssetId),

    #[error("Illegal state transition for asset {id}: {reason}")]
    IllegalStateTransition { id: AssetId, reason: String },

    #[error("Reindex target '{0}' already contains documents")]
    IndexNotReady(String),

    #[error("Migration of '{target}' failed: {reason}")]
    MigrationFailure { target: String, reason: String },

    #[error("Invalid asset snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl AssetError {
    /// Wrap an arbitrary backend failure without translating it.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(anyhow::Error::new(err))
    }
}
