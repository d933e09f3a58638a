//! Local filesystem storage backend.
//!
//! Each entry lives in `<root>/<id>.json` as an encoded envelope.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::entry::{decode_envelope, decode_metadata, encode_envelope};
use super::{Entry, EntryStore, ListedEntry, StoreResult};
use crate::error::StoreError;
use crate::id::is_valid_id;

const RECORD_EXTENSION: &str = "json";
const TEMP_MARKER: &str = ".tmp.";

/// Temp files older than this are leftovers from an interrupted write.
const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

// == Filesystem Store ==
/// Entry store writing one envelope file per id.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Opens the store, creating `root` if needed.
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `id`. Ids are restricted to ASCII
    /// alphanumerics, so the result can never leave `root`.
    fn record_path(&self, id: &str) -> StoreResult<PathBuf> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidKey(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.{RECORD_EXTENSION}")))
    }

    /// Removes `path` if it is an abandoned temp file. Returns true when the
    /// directory entry was a temp file, stale or not.
    async fn reap_temp_file(&self, path: &Path) -> bool {
        let is_temp = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.') && n.contains(TEMP_MARKER));
        if !is_temp {
            return false;
        }

        let stale = match fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified.elapsed().is_ok_and(|age| age > STALE_TEMP_AGE),
            Err(_) => false,
        };
        if stale {
            match fs::remove_file(path).await {
                Ok(()) => debug!("Removed stale temp file {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove temp file {}: {}", path.display(), e),
            }
        }
        true
    }
}

#[async_trait]
impl EntryStore for FilesystemStore {
    #[instrument(skip(self, entry), fields(backend = "filesystem"))]
    async fn put(&self, id: &str, entry: &Entry) -> StoreResult<()> {
        let path = self.record_path(id)?;
        let raw = encode_envelope(entry)?;

        // Write to a unique temp file, then rename over the record
        let temp_path = self
            .root
            .join(format!(".{id}{TEMP_MARKER}{}", Uuid::new_v4()));
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&raw).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, id: &str) -> StoreResult<Option<Entry>> {
        let Ok(path) = self.record_path(id) else {
            return Ok(None);
        };
        match fs::read(&path).await {
            Ok(raw) => Ok(decode_envelope(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn list(&self) -> StoreResult<Vec<ListedEntry>> {
        let mut listed = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if self.reap_temp_file(&path).await {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_valid_id(id) {
                continue;
            }

            let metadata = match fs::read(&path).await {
                Ok(raw) => decode_metadata(&raw),
                // Deleted between the directory scan and the read
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Failed to read record {}: {}", path.display(), e);
                    continue;
                }
            };

            listed.push(ListedEntry {
                id: id.to_string(),
                metadata,
            });
        }

        Ok(listed)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntryMetadata;
    use chrono::Utc;

    async fn temp_store() -> FilesystemStore {
        let root = std::env::temp_dir().join(format!("json_drop_test_{}", Uuid::new_v4()));
        FilesystemStore::new(root).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = temp_store().await;
        let entry = Entry::new(r#"[1,2,3]"#, Utc::now());

        store.put("abcDEF123456", &entry).await.unwrap();
        assert!(store.root().join("abcDEF123456.json").exists());
        assert_eq!(store.get("abcDEF123456").await.unwrap(), Some(entry));

        assert!(store.delete("abcDEF123456").await.unwrap());
        assert_eq!(store.get("abcDEF123456").await.unwrap(), None);
        assert!(!store.delete("abcDEF123456").await.unwrap());

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_keys() {
        let store = temp_store().await;
        let entry = Entry::new("{}", Utc::now());

        assert!(matches!(
            store.put("../escape", &entry).await,
            Err(StoreError::InvalidKey(_))
        ));
        assert_eq!(store.get("../escape").await.unwrap(), None);
        assert!(matches!(
            store.delete("a/b").await,
            Err(StoreError::InvalidKey(_))
        ));

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_failed_put_leaves_no_temp_file() {
        let store = temp_store().await;
        // A directory in the record's place makes the final rename fail
        std::fs::create_dir(store.root().join("blocked.json")).unwrap();

        let result = store.put("blocked", &Entry::new("{}", Utc::now())).await;
        assert!(matches!(result, Err(StoreError::Io(_))));

        let leftovers: Vec<_> = std::fs::read_dir(store.root())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(TEMP_MARKER))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_list_removes_stale_temp_files() {
        let store = temp_store().await;
        store.put("kept", &Entry::new("{}", Utc::now())).await.unwrap();

        let stale = store.root().join(".orphan.tmp.1111");
        let fresh = store.root().join(".inflight.tmp.2222");
        std::fs::write(&stale, b"partial").unwrap();
        std::fs::write(&fresh, b"partial").unwrap();
        let old = std::time::SystemTime::now() - Duration::from_secs(2 * 60 * 60);
        std::fs::File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "kept");
        assert!(!stale.exists());
        // A temp file from a write still in progress is left alone
        assert!(fresh.exists());

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_list_includes_corrupt_records() {
        let store = temp_store().await;
        store.put("good", &Entry::new("{}", Utc::now())).await.unwrap();
        std::fs::write(store.root().join("bad.json"), b"\x00\x01").unwrap();
        std::fs::write(store.root().join("notes.txt"), b"ignored").unwrap();

        let mut listed = store.list().await.unwrap();
        listed.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "bad");
        assert_eq!(listed[0].metadata, EntryMetadata::default());
        assert_eq!(listed[1].id, "good");
        assert!(listed[1].metadata.created.is_some());

        let _ = std::fs::remove_dir_all(store.root());
    }
}
