//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::entry::{decode_envelope, decode_metadata, encode_envelope};
use super::{Entry, EntryStore, ListedEntry, StoreResult};

// == Memory Store ==
/// Entry store keeping encoded envelopes in a `HashMap`.
///
/// Records are held in their persisted form so decoding behaves exactly
/// like the filesystem backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Encoded envelopes keyed by id
    records: RwLock<HashMap<String, Vec<u8>>>,
    /// Number of successful `put` calls
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes under `id` without encoding them.
    pub async fn insert_raw(&self, id: impl Into<String>, raw: impl Into<Vec<u8>>) {
        self.records.write().await.insert(id.into(), raw.into());
    }

    /// Returns the number of `put` calls served so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.records.read().await.contains_key(id)
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn put(&self, id: &str, entry: &Entry) -> StoreResult<()> {
        let raw = encode_envelope(entry)?;
        self.records.write().await.insert(id.to_string(), raw);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Entry>> {
        let records = self.records.read().await;
        Ok(records.get(id).and_then(|raw| decode_envelope(raw)))
    }

    async fn list(&self) -> StoreResult<Vec<ListedEntry>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .map(|(id, raw)| ListedEntry {
                id: id.clone(),
                metadata: decode_metadata(raw),
            })
            .collect())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}
