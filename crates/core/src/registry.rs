//! The patient registry: collection operations over an injected store.
//!
//! Every operation loads the full collection from the document store,
//! transforms it, and (for writes) stores the full collection back. No
//! record state is retained between operations. All operations serialise
//! behind one collection-wide lock, so concurrent writers cannot clobber
//! each other's read-modify-write cycles.

use crate::error::{RegistryError, RegistryResult};
use crate::record::{Patient, PatientInput, PatientUpdate, StoredPatient};
use indexmap::IndexMap;
use pmr_store::DocumentStore;
use pmr_types::NonEmptyText;
use std::sync::{Arc, Mutex, MutexGuard};

/// The collection as held by the document store: record id → source fields.
pub type RecordMap = IndexMap<String, StoredPatient>;

/// Field a listing can be sorted by. Derived `bmi` is computed live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl std::str::FromStr for SortField {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "height" => Ok(SortField::Height),
            "weight" => Ok(SortField::Weight),
            "bmi" => Ok(SortField::Bmi),
            unknown => Err(RegistryError::InvalidSortField(unknown.to_owned())),
        }
    }
}

/// Direction of a sorted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl std::str::FromStr for SortOrder {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            unknown => Err(RegistryError::InvalidSortOrder(unknown.to_owned())),
        }
    }
}

/// Keyed CRUD and sorting over the patient collection.
///
/// Holds the document store behind an `Arc<Mutex>`, so clones share one
/// lock and one underlying document. Pure data operations — no API
/// concerns.
#[derive(Debug)]
pub struct PatientRegistry<S> {
    store: Arc<Mutex<S>>,
}

impl<S> Clone for PatientRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> PatientRegistry<S>
where
    S: DocumentStore<StoredPatient>,
{
    /// Creates a new registry over the given document store.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> RegistryResult<MutexGuard<'_, S>> {
        self.store.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Looks up a single record by exact id.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if no record exists under `id`,
    /// or a store error if the collection cannot be loaded.
    pub fn get(&self, id: &str) -> RegistryResult<Patient> {
        let store = self.lock()?;
        let mut records = store.load()?;

        match records.swap_remove_entry(id) {
            Some((key, stored)) => Ok(rebuild(key, stored)),
            None => Err(RegistryError::NotFound(id.to_owned())),
        }
    }

    /// Returns all records in the store's insertion order.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection cannot be loaded.
    pub fn list(&self) -> RegistryResult<Vec<Patient>> {
        let store = self.lock()?;
        let records = store.load()?;

        Ok(records.into_iter().map(|(id, s)| rebuild(id, s)).collect())
    }

    /// Returns all records, stably sorted by the requested field.
    ///
    /// `bmi` is computed live from each record's current height/weight.
    /// Records with equal keys keep their insertion order.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection cannot be loaded. Token
    /// validation happens in the `FromStr` impls of [`SortField`] and
    /// [`SortOrder`] before this is called.
    pub fn sort_by(&self, field: SortField, order: SortOrder) -> RegistryResult<Vec<Patient>> {
        let mut patients = self.list()?;

        let key = |p: &Patient| match field {
            SortField::Height => p.height(),
            SortField::Weight => p.weight(),
            SortField::Bmi => p.bmi(),
        };
        patients.sort_by(|a, b| match order {
            SortOrder::Ascending => key(a).total_cmp(&key(b)),
            SortOrder::Descending => key(b).total_cmp(&key(a)),
        });

        Ok(patients)
    }

    /// Validates and inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` (wrapped) if the candidate violates the
    /// schema, `RegistryError::Conflict` if the id is already taken, or a
    /// store error. On any failure the stored collection is unchanged.
    pub fn create(&self, input: PatientInput) -> RegistryResult<Patient> {
        let patient = input.validate()?;

        let store = self.lock()?;
        let mut records = store.load()?;

        if records.contains_key(patient.id()) {
            return Err(RegistryError::Conflict(patient.id().to_owned()));
        }

        records.insert(patient.id().to_owned(), patient.to_stored());
        store.store(&records)?;

        tracing::debug!(id = patient.id(), "patient created");
        Ok(patient)
    }

    /// Merges a partial-update fragment into an existing record.
    ///
    /// The merged record goes through full validation before anything is
    /// written, so a failed update leaves the collection untouched.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if `id` is absent, a
    /// `ValidationError` (wrapped) if the merged record violates the schema,
    /// or a store error.
    pub fn update(&self, id: &str, fragment: &PatientUpdate) -> RegistryResult<Patient> {
        let store = self.lock()?;
        let mut records = store.load()?;

        let stored = records
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_owned()))?;

        let merged = rebuild(id.to_owned(), stored).apply(fragment)?;

        records.insert(id.to_owned(), merged.to_stored());
        store.store(&records)?;

        tracing::debug!(id, "patient updated");
        Ok(merged)
    }

    /// Removes a record by id.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if `id` is absent, or a store
    /// error.
    pub fn delete(&self, id: &str) -> RegistryResult<()> {
        let store = self.lock()?;
        let mut records = store.load()?;

        // shift_remove keeps the remaining records in insertion order.
        if records.shift_remove(id).is_none() {
            return Err(RegistryError::NotFound(id.to_owned()));
        }
        store.store(&records)?;

        tracing::debug!(id, "patient deleted");
        Ok(())
    }
}

fn rebuild(id: String, stored: StoredPatient) -> Patient {
    // Ids come back out of the store, which only ever holds keys that were
    // validated on the way in.
    let id = NonEmptyText::new(&id).unwrap_or_else(|_| {
        unreachable!("stored record key {id:?} is empty");
    });
    Patient::from_stored(id, stored)
}
