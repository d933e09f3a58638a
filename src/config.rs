//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default upload size limit (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default retention window in days
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Entries live in process memory and vanish on restart
    #[default]
    Memory,
    /// Entries are written as files under `data_dir`
    Filesystem,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "filesystem" | "fs" => Ok(Self::Filesystem),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Which backend stores entries
    pub storage: StorageKind,
    /// Root directory for the filesystem backend
    pub data_dir: PathBuf,
    /// Expiry sweep interval in seconds
    pub sweep_interval: u64,
    /// Days since last access after which an entry is deleted
    pub retention_days: i64,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORAGE_BACKEND` - `memory` or `filesystem` (default: memory)
    /// - `DATA_DIR` - Filesystem backend root (default: ./data)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 3600)
    /// - `RETENTION_DAYS` - Retention window in days (default: 30)
    /// - `MAX_UPLOAD_BYTES` - Upload size limit (default: 5 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            storage: env_or("STORAGE_BACKEND", defaults.storage),
            data_dir: env::var("DATA_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            retention_days: env_or("RETENTION_DAYS", defaults.retention_days),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }

    /// Retention window as a duration.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            storage: StorageKind::Memory,
            data_dir: PathBuf::from("./data"),
            sweep_interval: 3600,
            retention_days: DEFAULT_RETENTION_DAYS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Parses `key` from the environment, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
