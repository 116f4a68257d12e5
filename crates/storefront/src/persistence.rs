//! Persistence adapter: one JSON array of line items under one storage key.
//!
//! Loading never fails. A missing key is an empty container, and a corrupt
//! value is logged and treated as empty so a bad write cannot brick the page.
//! [`Persistence::try_load`] is the strict variant for callers that want to
//! see the error.

use serde_json::Value;
use tracing::{debug, warn};

use fusion_core::{ItemKey, LineItem};

use crate::storage::{KeyValueStore, StorageError};

/// Reads and writes a line-item list under a fixed key.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    key: &'static str,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Bind a store to a key.
    pub const fn new(store: S, key: &'static str) -> Self {
        Self { store, key }
    }

    /// The storage key this adapter owns.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Load the stored items, recovering from any storage problem.
    ///
    /// Unreadable entries inside an otherwise valid array are skipped, and
    /// entries sharing an identity key are merged by summing quantities.
    pub fn load(&self) -> Vec<LineItem> {
        match self.try_load() {
            Ok(items) => items,
            Err(e) => {
                warn!(key = self.key, error = %e, "Discarding unreadable stored items");
                Vec::new()
            }
        }
    }

    /// Load the stored items, surfacing read and decode failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the value is not a JSON array.
    pub fn try_load(&self) -> Result<Vec<LineItem>, StorageError> {
        let Some(raw) = self.store.get(self.key)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<Value> =
            serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: self.key.to_string(),
                source,
            })?;

        let mut items: Vec<LineItem> = Vec::with_capacity(entries.len());
        for entry in entries {
            let item = match serde_json::from_value::<LineItem>(entry) {
                Ok(item) => item,
                Err(e) => {
                    warn!(key = self.key, error = %e, "Skipping malformed stored item");
                    continue;
                }
            };
            merge_into(&mut items, item);
        }

        debug!(key = self.key, count = items.len(), "Loaded stored items");
        Ok(items)
    }

    /// Replace the stored value with `items`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn store(&self, items: &[LineItem]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items).map_err(|source| StorageError::Encode {
            key: self.key.to_string(),
            source,
        })?;
        self.store.set(self.key, &json)
    }

    /// Delete the stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(self.key)
    }
}

fn merge_into(items: &mut Vec<LineItem>, item: LineItem) {
    let key: ItemKey = item.key();
    if let Some(existing) = items.iter_mut().find(|it| it.matches(&key)) {
        existing.add_quantity(item.quantity());
    } else {
        items.push(item);
    }
}
