//! API Module
//!
//! HTTP handlers and routing for the drop service.
//!
//! # Endpoints
//! - `POST /upload` - Store a JSON payload, returns its id
//! - `GET /download/:id` - Retrieve a payload by id
//! - `OPTIONS *` - CORS preflight
//! - anything else - 404 pointing at the project repository

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
