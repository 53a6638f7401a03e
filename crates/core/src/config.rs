//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::DEFAULT_DATA_FILE;
use crate::{RegistryError, RegistryResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_file: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns a `RegistryError` if `data_file` does not name a file.
    pub fn new(data_file: PathBuf) -> RegistryResult<Self> {
        if data_file.file_name().is_none() {
            return Err(RegistryError::Store(pmr_store::StoreError::InvalidPath(
                format!("data file path has no file name: {}", data_file.display()),
            )));
        }

        Ok(Self { data_file })
    }

    /// Path of the JSON document holding the record collection.
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }
}

/// Resolve the record document path from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default
/// `patients.json` in the working directory.
pub fn data_file_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_accepts_plain_file_path() {
        let cfg = CoreConfig::new(PathBuf::from("patients.json")).expect("should accept");
        assert_eq!(cfg.data_file(), Path::new("patients.json"));
    }

    #[test]
    fn test_config_rejects_path_without_file_name() {
        assert!(CoreConfig::new(PathBuf::from("/")).is_err());
    }

    #[test]
    fn test_data_file_env_value_defaults_when_unset_or_blank() {
        assert_eq!(
            data_file_from_env_value(None),
            PathBuf::from("patients.json")
        );
        assert_eq!(
            data_file_from_env_value(Some("   ".into())),
            PathBuf::from("patients.json")
        );
    }

    #[test]
    fn test_data_file_env_value_uses_override() {
        assert_eq!(
            data_file_from_env_value(Some("/data/records.json".into())),
            PathBuf::from("/data/records.json")
        );
    }
}
