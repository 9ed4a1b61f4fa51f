//! Durable named-blob storage with atomic writes.
//!
//! One JSON blob per name, written via a temp file in the same directory and
//! an atomic rename. The refresh job and the presentation process share this
//! directory without locks; the rename is what keeps a reader from ever
//! observing a partially written value.

use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::QuilterError;

/// On-disk key/value store rooted under the configured state directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    directory: PathBuf,
}

impl CacheStore {
    pub fn new(state_directory: &Path) -> Self {
        Self {
            directory: state_directory.join("quilter").join("cache"),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.json", name))
    }

    /// Atomically replace the blob under `name`.
    ///
    /// Serialization happens into a private temp file first; if it fails
    /// partway, the temp file is discarded and the previously committed blob
    /// is left untouched.
    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), QuilterError> {
        fs::create_dir_all(&self.directory)?;

        let mut tmp = NamedTempFile::new_in(&self.directory)?;
        serde_json::to_writer(&mut tmp, value)?;
        tmp.flush()?;
        tmp.persist(self.blob_path(name))
            .map_err(|e| QuilterError::Io(e.error))?;

        debug!(name, "cache blob written");
        Ok(())
    }

    /// Read the blob under `name`; `CacheMiss` when it was never written
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T, QuilterError> {
        let path = self.blob_path(name);
        if !path.exists() {
            return Err(QuilterError::CacheMiss(name.to_string()));
        }
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Modification time of the blob under `name`, if present
    pub fn last_updated_at(&self, name: &str) -> Option<DateTime<Utc>> {
        let meta = fs::metadata(self.blob_path(name)).ok()?;
        meta.modified().ok().map(DateTime::<Utc>::from)
    }

    /// Remove the whole cache directory, ignoring absence
    pub fn clear(&self) -> Result<(), QuilterError> {
        info!("clearing the cache");
        if self.directory.exists() {
            fs::remove_dir_all(&self.directory)?;
        }
        Ok(())
    }
}
