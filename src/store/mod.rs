//! Durable preference storage backends.
//!
//! The registry persists exactly one value, the display mode, under
//! [`MODE_STORAGE_KEY`](crate::MODE_STORAGE_KEY). Backends stand in for the
//! browser's per-origin key-value storage.

pub mod memory;
pub mod file;

/// Error type for preference storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage is not available (private browsing, sandboxing, read-only medium).
    #[error("Preference storage unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write because it is full.
    #[error("Preference storage quota exceeded")]
    QuotaExceeded,

    /// Underlying I/O failure.
    #[error("Preference storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted file could not be parsed or written as JSON.
    #[error("Preference storage is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for durable string key-value storage.
///
/// Implementations must be cheap to call from the UI thread; every method is
/// synchronous.
pub trait PreferenceStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

pub use memory::InMemoryPreferenceStore;
pub use file::FilePreferenceStore;
