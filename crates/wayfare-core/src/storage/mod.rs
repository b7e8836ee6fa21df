//! Durable client key-value storage.
//!
//! The session record and the companion cookie both live in a
//! `KeyValueStorage`: a string-keyed slot store with the same shape as the
//! browser's local storage. Backends:
//! - `MemoryStorage`: in-process map, can be disabled to simulate blocked storage
//! - `FileStorage`: one JSON file per key under a data directory
//! - `KeyringStorage`: OS keychain entries

pub mod file;
pub mod keychain;
pub mod memory;

use std::sync::Arc;

use crate::error::StorageError;

pub use file::FileStorage;
pub use keychain::KeyringStorage;
pub use memory::MemoryStorage;

pub trait KeyValueStorage: Send + Sync {
    /// Read a slot. A missing slot is `Ok(None)`, not an error.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a slot. Removing a missing slot succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Short backend name used in logs and errors
    fn backend_name(&self) -> &'static str;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
