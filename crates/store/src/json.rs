//! JSON-file implementation of the document store.

use crate::{DocumentStore, StoreError};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A document store backed by a single JSON file.
///
/// The file holds one JSON object keyed by record id, pretty-printed so it
/// stays inspectable by hand. Key order in the file is insertion order.
///
/// # Write Semantics
///
/// `store` writes the new document to a sibling temporary file and renames
/// it over the target. The rename is the commit point: a failure at any
/// earlier step leaves the previous document intact, so readers never see a
/// truncated or half-written collection.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` for the given document path.
    ///
    /// The file itself does not need to exist yet — a missing document reads
    /// as an empty collection — but the path must name a file, and its
    /// parent directory (when one is named) must already exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the JSON document
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if:
    /// - the path has no file name component,
    /// - the path exists but is a directory,
    /// - the named parent directory does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let Some(file_name) = path.file_name() else {
            return Err(StoreError::InvalidPath(format!(
                "path has no file name: {}",
                path.display()
            )));
        };

        if path.is_dir() {
            return Err(StoreError::InvalidPath(format!(
                "path is a directory: {}",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(StoreError::InvalidPath(format!(
                    "parent directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        let mut temp_name = file_name.to_owned();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        Ok(Self { path, temp_path })
    }

    /// Returns the path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> DocumentStore<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<IndexMap<String, T>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(StoreError::Corrupt),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IndexMap::new()),
            Err(e) => Err(StoreError::Read(e)),
        }
    }

    fn store(&self, records: &IndexMap<String, T>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(StoreError::Serialise)?;

        fs::write(&self.temp_path, json).map_err(StoreError::Write)?;
        fs::rename(&self.temp_path, &self.path).map_err(StoreError::Write)?;

        Ok(())
    }
}
