//! PMR Document Storage
//!
//! This crate provides flat-document persistence for the Patient Medical
//! Registry (PMR).
//!
//! ## Design Principles
//!
//! - The whole collection is one document, read and written as a unit
//! - A write either fully replaces the document or leaves it untouched
//! - Derived values are never persisted; the document holds source fields only
//! - The storage seam is a trait, so core logic is testable without file I/O
//! - Document order is insertion order, preserved across load/store cycles
//!
//! ## Example Usage
//!
//! ```no_run
//! use pmr_store::{DocumentStore, JsonFileStore};
//! use indexmap::IndexMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = JsonFileStore::new("patients.json")?;
//! let mut records: IndexMap<String, serde_json::Value> = store.load()?;
//! records.insert("P001".into(), serde_json::json!({"name": "Josh"}));
//! store.store(&records)?;
//! # Ok(())
//! # }
//! ```

mod json;
mod memory;

pub use indexmap::IndexMap;
pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Errors that can occur during document storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The configured document path cannot be used
    #[error("invalid store path: {0}")]
    InvalidPath(String),

    /// The document exists but could not be read
    #[error("failed to read record document: {0}")]
    Read(std::io::Error),

    /// The document could not be written or replaced
    #[error("failed to write record document: {0}")]
    Write(std::io::Error),

    /// The document exists but is not valid JSON of the expected shape
    #[error("record document is corrupt: {0}")]
    Corrupt(serde_json::Error),

    /// The collection could not be serialised
    #[error("failed to serialise record document: {0}")]
    Serialise(serde_json::Error),

    /// An in-memory store lock was poisoned by an earlier panic
    #[error("in-memory store lock poisoned")]
    Poisoned,
}

/// A keyed collection of records, persisted as one unit.
///
/// `load` returns the entire collection; a missing document is an empty
/// collection, not an error. `store` replaces the entire document
/// atomically — there is no partial write.
///
/// Iteration order of the returned map is the document's insertion order,
/// and implementations must preserve it across a `store`/`load` round trip.
pub trait DocumentStore<T> {
    /// Loads the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the document exists but cannot be read or
    /// parsed.
    fn load(&self) -> Result<IndexMap<String, T>, StoreError>;

    /// Replaces the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the collection cannot be serialised or the
    /// document cannot be written.
    fn store(&self, records: &IndexMap<String, T>) -> Result<(), StoreError>;
}

impl<T, S> DocumentStore<T> for Box<S>
where
    S: DocumentStore<T> + ?Sized,
{
    fn load(&self) -> Result<IndexMap<String, T>, StoreError> {
        (**self).load()
    }

    fn store(&self, records: &IndexMap<String, T>) -> Result<(), StoreError> {
        (**self).store(records)
    }
}
