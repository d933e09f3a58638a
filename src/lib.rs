//! JSON Drop - A minimal anonymous JSON drop service
//!
//! Clients upload a JSON payload, receive a short random id, and download it
//! again within a retention window that each download extends.

pub mod api;
pub mod config;
pub mod error;
pub mod id;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use store::{EntryStore, FilesystemStore, MemoryStore};
pub use tasks::spawn_sweep_task;
