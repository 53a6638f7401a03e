//! In-memory implementation of the document store, for tests.

use crate::{DocumentStore, StoreError};
use indexmap::IndexMap;
use std::sync::Mutex;

/// A document store that keeps the collection in memory.
///
/// Exists so registry logic can be exercised without touching the
/// filesystem. Semantics mirror [`crate::JsonFileStore`]: `load` hands back
/// a copy of the whole collection and `store` replaces it wholesale.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    records: Mutex<IndexMap<String, T>>,
}

impl<T> MemoryStore<T> {
    /// Creates an empty `MemoryStore`.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(IndexMap::new()),
        }
    }

    /// Creates a `MemoryStore` seeded with the given collection.
    pub fn with_records(records: IndexMap<String, T>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl<T: Clone> DocumentStore<T> for MemoryStore<T> {
    fn load(&self) -> Result<IndexMap<String, T>, StoreError> {
        let guard = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn store(&self, records: &IndexMap<String, T>) -> Result<(), StoreError> {
        let mut guard = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = records.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trips_collection() {
        let store = MemoryStore::new();
        let mut records = IndexMap::new();
        records.insert("P001".to_owned(), 1u32);
        records.insert("P002".to_owned(), 2u32);

        store.store(&records).unwrap();
        assert_eq!(store.load().unwrap(), records);
    }

    #[test]
    fn test_memory_store_starts_empty() {
        let store: MemoryStore<u32> = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_seeded_store_serves_seed() {
        let mut records = IndexMap::new();
        records.insert("P001".to_owned(), "seed".to_owned());
        let store = MemoryStore::with_records(records);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get("P001").map(String::as_str), Some("seed"));
    }
}
