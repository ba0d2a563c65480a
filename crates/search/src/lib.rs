//! Search-index capability and the in-memory reference backend.
//!
//! The [`SearchIndexer`] trait is the narrow contract this layer has with
//! whatever document store backs discovery. Callers outside the index
//! rotation machinery address indexes only through aliases; physical
//! index names are an implementation detail of the version manager.

pub mod indexer;
pub mod memory;

pub use indexer::SearchIndexer;
pub use memory::MemoryIndexer;
