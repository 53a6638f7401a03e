//! # PMR Core
//!
//! Core business logic for the PMR patient record system.
//!
//! This crate contains pure data operations over the record collection:
//! - The record schema: field validation, derived-field computation
//!   (`bmi`, `verdict`) and partial-update merging
//! - The registry: keyed CRUD and sorting over an injected document store
//! - The error taxonomy and startup configuration
//!
//! **No API concerns**: HTTP servers, routing and status-code mapping belong
//! in `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod record;
pub mod registry;

pub use config::CoreConfig;
pub use error::{RegistryError, RegistryResult};
pub use record::{
    bmi, Patient, PatientInput, PatientUpdate, StoredPatient, ValidationError, Verdict, Violation,
};
pub use registry::{PatientRegistry, SortField, SortOrder};

pub use pmr_types::{Gender, NonEmptyText};
