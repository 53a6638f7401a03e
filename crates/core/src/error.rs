use crate::record::ValidationError;
use pmr_store::StoreError;

/// Errors surfaced by registry operations.
///
/// Each variant maps onto exactly one caller-facing outcome; nothing is
/// retried or recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// One or more record fields violated the schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No record exists under the requested id
    #[error("no patient with id {0:?}")]
    NotFound(String),

    /// A record already exists under the id being created
    #[error("a patient with id {0:?} already exists")]
    Conflict(String),

    /// The sort field token was not recognised
    #[error("unknown sort field {0:?} (expected height, weight or bmi)")]
    InvalidSortField(String),

    /// The sort order token was not recognised
    #[error("unknown sort order {0:?} (expected asc or desc)")]
    InvalidSortOrder(String),

    /// The document store failed to load or persist the collection
    #[error("record store failure: {0}")]
    Store(#[from] StoreError),

    /// The registry lock was poisoned by an earlier panic
    #[error("registry lock poisoned by an earlier panic")]
    LockPoisoned,
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
