//! Error types for the drop service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

// == Store Error Enum ==
/// Failures raised by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key is not a valid entry id
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

// == Drop Error Enum ==
/// Unified error type for the HTTP handlers.
#[derive(Error, Debug)]
pub enum DropError {
    /// Upload did not declare `application/json`
    #[error("Only JSON allowed")]
    UnsupportedContentType,

    /// Upload body exceeded the size limit
    #[error("Payload too large (max {0} bytes)")]
    PayloadTooLarge(usize),

    /// Upload body could not be read
    #[error("Failed to read request body")]
    BodyRead(String),

    /// Upload body is not well-formed JSON
    #[error("Invalid JSON")]
    InvalidJson,

    /// No entry stored under the requested id
    #[error("Not found")]
    NotFound(String),

    /// Storage backend failure
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for DropError {
    fn into_response(self) -> Response {
        let status = match &self {
            DropError::UnsupportedContentType | DropError::InvalidJson => StatusCode::BAD_REQUEST,
            DropError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DropError::BodyRead(reason) => {
                debug!(%reason, "Upload body rejected");
                StatusCode::BAD_REQUEST
            }
            DropError::NotFound(id) => {
                debug!(%id, "Entry not found");
                StatusCode::NOT_FOUND
            }
            DropError::Storage(err) => {
                error!("Storage backend failure: {}", err);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
            }
        };

        (status, self.to_string()).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP handlers.
pub type Result<T> = std::result::Result<T, DropError>;
