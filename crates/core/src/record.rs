//! Shared asset record shape and lifecycle rules.
//!
//! Every asset kind managed by this layer is wrapped in [`AssetRecord`],
//! which carries the identity, timestamps, and visibility flags the
//! service layer enforces. The kind-specific payload stays opaque here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::types::{AssetId, Timestamp};

/// Marker trait for concrete asset kinds.
///
/// The `KIND` tag names the asset type in the service registry and in
/// default alias naming (`{prefix}-{KIND}`).
pub trait AssetKind:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    const KIND: &'static str;
}

/// A versioned, soft-deletable domain record.
///
/// `deleted_on` being `Some` means the row is soft-deleted: invisible to
/// normal reads but still present in the primary store and reachable
/// through explicit include-deleted paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord<T> {
    pub id: AssetId,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
    pub deleted_on: Option<Timestamp>,
    /// Draft/scratch marker. May only transition `true -> false`.
    pub temporary: bool,
    /// Eligible for global discovery.
    pub public_asset: bool,
    pub payload: T,
}

impl<T> AssetRecord<T> {
    pub fn is_deleted(&self) -> bool {
        self.deleted_on.is_some()
    }

    /// The search-mirroring predicate: public, permanent, not deleted.
    ///
    /// Any transition that flips this value must add or remove the
    /// mirrored index document in the same logical operation.
    pub fn is_indexable(&self) -> bool {
        self.public_asset && !self.temporary && self.deleted_on.is_none()
    }
}

/// Input for creating a new asset.
///
/// `id` is normally absent (the service assigns one); migration and
/// import paths may supply it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAsset<T> {
    pub id: Option<AssetId>,
    pub temporary: bool,
    pub public_asset: bool,
    pub payload: T,
}

/// Enforce monotonic permanence: once an asset is permanent
/// (`temporary == false`), no update may flip it back to a draft.
///
/// Checked before any write; a violation leaves the stored record
/// untouched.
pub fn check_permanence<T>(
    old: &AssetRecord<T>,
    new: &AssetRecord<T>,
) -> Result<(), AssetError> {
    if !old.temporary && new.temporary {
        return Err(AssetError::IllegalStateTransition {
            id: old.id,
            reason: "a permanent asset cannot be made temporary again".to_string(),
        });
    }
    Ok(())
}
