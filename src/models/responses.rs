//! Response DTOs for the drop service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

/// Response body for a successful upload (POST /upload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Id the payload can be downloaded under
    pub id: String,
}

impl UploadResponse {
    /// Creates a new UploadResponse
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
