//! Response models for the drop service API
//!
//! This module defines the DTOs serialized into HTTP response bodies.
//! Uploads are accepted as raw text, so there are no request DTOs.

pub mod responses;

pub use responses::UploadResponse;
