//! Expiry Sweep Task
//!
//! Background task that periodically deletes entries not accessed within the
//! retention window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::store::{EntryMetadata, EntryStore};

/// Outcome of a single sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries inspected
    pub examined: usize,
    /// Entries removed
    pub deleted: usize,
    /// Entries whose deletion failed
    pub failed: usize,
}

/// Instant retention is measured from.
///
/// The last-access date counts from midnight UTC; `created` is the fallback.
pub fn governing_timestamp(metadata: &EntryMetadata) -> Option<DateTime<Utc>> {
    metadata
        .last_accessed_date
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .or(metadata.created)
}

/// Returns true if an entry with `metadata` is past `retention` at `now`.
///
/// Entries without any usable date are always expired.
pub fn is_expired(metadata: &EntryMetadata, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
    match governing_timestamp(metadata) {
        Some(timestamp) => now - timestamp > retention,
        None => true,
    }
}

/// Runs one sweep over every entry in `store`.
///
/// A failed delete is logged and counted; the remaining entries are still processed.
pub async fn sweep_expired(
    store: &dyn EntryStore,
    now: DateTime<Utc>,
    retention: chrono::Duration,
) -> SweepReport {
    let mut report = SweepReport::default();

    let listed = match store.list().await {
        Ok(listed) => listed,
        Err(e) => {
            error!("Expiry sweep: listing failed: {}", e);
            return report;
        }
    };

    for item in listed {
        report.examined += 1;
        if !is_expired(&item.metadata, now, retention) {
            continue;
        }

        match store.delete(&item.id).await {
            Ok(_) => {
                debug!(id = %item.id, "Expiry sweep: deleted entry");
                report.deleted += 1;
            }
            Err(e) => {
                warn!(id = %item.id, "Expiry sweep: delete failed: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store: Arc<dyn EntryStore> = Arc::new(MemoryStore::new());
/// let sweep_handle = spawn_sweep_task(store.clone(), 3600, chrono::Duration::days(30));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(
    store: Arc<dyn EntryStore>,
    sweep_interval_secs: u64,
    retention: chrono::Duration,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds, retention of {} days",
            sweep_interval_secs,
            retention.num_days()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = sweep_expired(store.as_ref(), Utc::now(), retention).await;

            if report.deleted > 0 || report.failed > 0 {
                info!(
                    "Expiry sweep: examined {}, deleted {}, failed {}",
                    report.examined, report.deleted, report.failed
                );
            } else {
                debug!("Expiry sweep: no expired entries among {}", report.examined);
            }
        }
    })
}
