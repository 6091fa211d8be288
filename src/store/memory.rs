//! In-memory preference store.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{PreferenceStore, StoreError};

/// In-memory preference store.
///
/// Values survive as long as the store does; share one `Arc` between two
/// registries to simulate a reload against the same storage.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: RwLock<BTreeMap<String, String>>,
    read_only: bool,
}

impl InMemoryPreferenceStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose writes always fail with `QuotaExceeded`.
    pub fn read_only() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            read_only: true,
        }
    }

    /// Create a store pre-populated with `key = value`.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.values.write().insert(key.into(), value.into());
        store
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::QuotaExceeded);
        }
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
