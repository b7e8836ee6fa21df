use std::path::{Path, PathBuf};

use tracing::debug;

use super::KeyValueStorage;
use crate::error::StorageError;

const BACKEND: &str = "file";

/// Storage backed by one file per key in a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created lazily on first write.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Map a storage key onto a safe file stem (no separators or dot segments)
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.item_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| StorageError::unavailable(BACKEND, format!("{}: {}", path.display(), e)))?;
        Ok(Some(contents))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            StorageError::unavailable(BACKEND, format!("{}: {}", self.dir.display(), e))
        })?;
        let path = self.item_path(key);
        std::fs::write(&path, value)
            .map_err(|e| StorageError::unavailable(BACKEND, format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Wrote storage item");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.item_path(key);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                StorageError::unavailable(BACKEND, format!("{}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}
