//! Key-value storage backing the cart and wishlist.
//!
//! # Architecture
//!
//! The [`KeyValueStore`] trait models browser-style local storage: string
//! keys, string values, no transactions. Two implementations are provided:
//!
//! - [`MemoryStore`] - process-local map, used in tests and ephemeral sessions
//! - [`FileStore`] - one file per key under a directory, used by the CLI
//!
//! Each container owns exactly one key. Two processes pointed at the same
//! directory can overwrite each other's writes; nothing here guards against it.

mod file;
mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key contains characters the backend cannot represent.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Stored content could not be decoded.
    #[error("Corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded.
    #[error("Failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string key-value store.
///
/// All methods take `&self`; implementations use interior mutability.
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read a value. Returns `Ok(None)` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Succeeds even if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to delete.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Whether a key is safe for every backend (`[A-Za-z0-9_.-]`, not starting with `.`).
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
