//! API Handlers
//!
//! HTTP request handlers for upload, download and the fallback route.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::de::IgnoredAny;
use tracing::{debug, info, warn};

use crate::config::{Config, StorageKind, DEFAULT_MAX_UPLOAD_BYTES};
use crate::error::{DropError, Result};
use crate::id::{is_valid_id, IdGenerator};
use crate::models::UploadResponse;
use crate::store::{Entry, EntryStore, FilesystemStore, MemoryStore, StoreResult};

/// Body of every response from the fallback route
pub const REPOSITORY_URL: &str = "https://github.com/misieur/api.misieur.me";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Application state shared across all handlers.
///
/// Holds no mutable state of its own; the store is the only shared resource.
#[derive(Clone)]
pub struct AppState {
    /// Backend entries are read from and written to
    pub store: Arc<dyn EntryStore>,
    /// Source of fresh entry ids
    pub ids: Arc<IdGenerator>,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Creates a new AppState over `store` with OS randomness and the default size limit.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            ids: Arc::new(IdGenerator::default()),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Replaces the id generator.
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Replaces the upload size limit.
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured storage backend.
    pub async fn from_config(config: &Config) -> StoreResult<Self> {
        let store: Arc<dyn EntryStore> = match config.storage {
            StorageKind::Memory => Arc::new(MemoryStore::new()),
            StorageKind::Filesystem => Arc::new(FilesystemStore::new(&config.data_dir).await?),
        };
        Ok(Self::new(store).with_max_upload_bytes(config.max_upload_bytes))
    }
}

/// Handler for POST /upload
///
/// Checks content type, size and JSON well-formedness in that order, then
/// stores the raw body under a fresh id. A body rejected by the router's
/// length limit still loses to a wrong content type.
pub async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<UploadResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if content_type != Some(JSON_CONTENT_TYPE) {
        return Err(DropError::UnsupportedContentType);
    }

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            DropError::PayloadTooLarge(state.max_upload_bytes)
        } else {
            DropError::BodyRead(rejection.body_text())
        }
    })?;
    if body.len() > state.max_upload_bytes {
        return Err(DropError::PayloadTooLarge(state.max_upload_bytes));
    }

    // Parsed value is discarded; only the raw text is stored
    serde_json::from_slice::<IgnoredAny>(&body).map_err(|_| DropError::InvalidJson)?;
    let content = String::from_utf8(body.to_vec()).map_err(|_| DropError::InvalidJson)?;

    let id = state.ids.generate();
    let size = content.len();
    state.store.put(&id, &Entry::new(content, Utc::now())).await?;

    info!(%id, size, "Stored upload");
    Ok(Json(UploadResponse::new(id)))
}

/// Handler for GET /download/*path
///
/// The id is the final path segment. A hit refreshes the last-access date
/// at most once per UTC day before the stored content is returned.
pub async fn download_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    let id = path.rsplit('/').next().unwrap_or_default();
    if !is_valid_id(id) {
        return Err(DropError::NotFound(id.to_string()));
    }

    let mut entry = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| DropError::NotFound(id.to_string()))?;

    let now = Utc::now();
    if !entry.metadata.is_accessed_on(now.date_naive()) {
        entry.metadata = entry.metadata.refreshed(now);
        match state.store.put(id, &entry).await {
            Ok(()) => debug!(%id, "Refreshed last access date"),
            Err(e) => warn!(%id, "Failed to refresh last access date: {}", e),
        }
    }

    Ok((
        [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
        entry.content,
    )
        .into_response())
}

/// Handler for GET /download/ with no id segment.
pub async fn missing_id_handler() -> DropError {
    DropError::NotFound(String::new())
}

/// Fallback for every unmatched method or path.
pub async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, REPOSITORY_URL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RandomSource;
    use crate::error::StoreError;
    use crate::store::{EntryMetadata, ListedEntry};
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use chrono::Duration;

    struct Zeros;

    impl RandomSource for Zeros {
        fn fill(&self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn test_state() -> (Arc<MemoryStore>, AppState) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone()).with_id_generator(IdGenerator::new(Zeros));
        (store, state)
    }

    #[tokio::test]
    async fn test_upload_and_download_handler() {
        let (store, state) = test_state();

        let response = upload_handler(
            State(state.clone()),
            json_headers(),
            Ok(Bytes::from_static(br#"{"name": "drop"}"#)),
        )
        .await
        .unwrap();
        assert_eq!(response.id, "AAAAAAAAAAAA");
        assert_eq!(store.write_count(), 1);

        let response = download_handler(State(state), Path("AAAAAAAAAAAA".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Uploaded today, so no refresh write
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_wrong_content_type() {
        let (store, state) = test_state();
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let result = upload_handler(State(state), headers, Ok(Bytes::from_static(b"{}"))).await;
        assert!(matches!(result, Err(DropError::UnsupportedContentType)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_content_type() {
        let (_, state) = test_state();
        let result = upload_handler(State(state), HeaderMap::new(), Ok(Bytes::from_static(b"{}"))).await;
        assert!(matches!(result, Err(DropError::UnsupportedContentType)));
    }

    #[tokio::test]
    async fn test_upload_size_checked_before_json() {
        let (_, state) = test_state();
        let state = state.with_max_upload_bytes(4);

        let result = upload_handler(State(state), json_headers(), Ok(Bytes::from_static(b"{ invalid"))).await;
        assert!(matches!(result, Err(DropError::PayloadTooLarge(4))));
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_json() {
        let (store, state) = test_state();

        let result = upload_handler(State(state), json_headers(), Ok(Bytes::from_static(b"{ invalid json"))).await;
        assert!(matches!(result, Err(DropError::InvalidJson)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_download_missing() {
        let (_, state) = test_state();
        let result = download_handler(State(state), Path("doesnotexist1".to_string())).await;
        assert!(matches!(result, Err(DropError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_uses_last_segment() {
        let (store, state) = test_state();
        store.put("target", &Entry::new("42", Utc::now())).await.unwrap();

        let result = download_handler(State(state), Path("nested/dirs/target".to_string())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_download_refreshes_stale_access_date() {
        let (store, state) = test_state();
        let created = Utc::now() - Duration::days(10);
        store.put("old", &Entry::new("[1]", created)).await.unwrap();

        download_handler(State(state.clone()), Path("old".to_string()))
            .await
            .unwrap();
        assert_eq!(store.write_count(), 2);

        let stored = store.get("old").await.unwrap().unwrap();
        assert_eq!(stored.content, "[1]");
        assert_eq!(stored.metadata.created, Some(created));
        assert!(stored.metadata.is_accessed_on(Utc::now().date_naive()));

        // Second read on the same day must not write again
        download_handler(State(state), Path("old".to_string()))
            .await
            .unwrap();
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_download_refresh_restores_missing_created() {
        let (store, state) = test_state();
        store.insert_raw("nodates", r#"{"content":"true"}"#).await;

        download_handler(State(state), Path("nodates".to_string()))
            .await
            .unwrap();

        let stored = store.get("nodates").await.unwrap().unwrap();
        assert_ne!(stored.metadata, EntryMetadata::default());
        assert!(stored.metadata.created.is_some());
    }

    /// Store that serves reads but refuses every write.
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl EntryStore for ReadOnlyStore {
        async fn put(&self, _id: &str, _entry: &Entry) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }

        async fn get(&self, id: &str) -> StoreResult<Option<Entry>> {
            self.0.get(id).await
        }

        async fn list(&self) -> StoreResult<Vec<ListedEntry>> {
            self.0.list().await
        }

        async fn delete(&self, id: &str) -> StoreResult<bool> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_download_survives_failed_refresh() {
        let inner = MemoryStore::new();
        let stale = Utc::now() - Duration::days(5);
        inner.put("stale", &Entry::new(r#"{"kept":1}"#, stale)).await.unwrap();
        let store = Arc::new(ReadOnlyStore(inner));
        let state = AppState::new(store.clone());

        let response = download_handler(State(state), Path("stale".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"kept":1}"#);

        // The stored record keeps its old access date
        let stored = store.get("stale").await.unwrap().unwrap();
        assert_eq!(stored.metadata.last_accessed_date, Some(stale.date_naive()));
    }

    #[tokio::test]
    async fn test_missing_id_handler() {
        let response = missing_id_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_not_found_handler() {
        let (status, body) = not_found_handler().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, REPOSITORY_URL);
    }
}
