//! Store Module
//!
//! Storage abstraction for entries plus the in-memory and filesystem backends.

mod entry;
mod filesystem;
mod memory;

use async_trait::async_trait;

use crate::error::StoreError;

// Re-export public types
pub use entry::{decode_envelope, encode_envelope, Entry, EntryMetadata, ListedEntry};
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key-value capability the handlers and the sweep run against.
///
/// Implementations only guarantee atomicity per single key.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Stores `entry` under `id`, replacing any previous record.
    async fn put(&self, id: &str, entry: &Entry) -> StoreResult<()>;

    /// Fetches the entry stored under `id`.
    ///
    /// Unknown ids and unreadable records both return `None`.
    async fn get(&self, id: &str) -> StoreResult<Option<Entry>>;

    /// Lists every stored id with its metadata.
    ///
    /// Unreadable records are listed with empty metadata.
    async fn list(&self) -> StoreResult<Vec<ListedEntry>>;

    /// Removes the record under `id`. Returns `true` if it existed.
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}
