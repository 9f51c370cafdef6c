//! Incremental deletion of exported audit rows.
//!
//! There is no truncate that keeps the newest row and is safe against
//! concurrent trigger inserts, so rows are deleted in small `audit_pk`
//! ranges instead, re-reading the table statistics before every batch.
//! The newest row always survives; it anchors the cursor of the next sync.

use std::time::Duration;

use audit_core::{AuditStore, Result};
use tracing::{debug, info};

/// Batch sizing and pacing of a wipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WipeConfig {
    /// Width of each deleted `audit_pk` range
    pub batch_size: u32,
    /// Pause between consecutive batches
    pub pause: Duration,
}

impl Default for WipeConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            pause: Duration::from_secs(1),
        }
    }
}

/// Outcome of wiping one audit table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WipeReport {
    pub batches: u64,
    pub deleted: u64,
}

/// Delete every row of `audit_table` except the newest, in bounded batches.
///
/// A failed delete aborts the wipe. The rows deleted so far stay deleted,
/// which is safe: every one of them was already exported.
pub async fn wipe_table<S: AuditStore + ?Sized>(
    store: &mut S,
    audit_table: &str,
    config: &WipeConfig,
) -> Result<WipeReport> {
    let batch_size = i64::from(config.batch_size.max(1));
    let mut report = WipeReport::default();

    info!("Wiping {audit_table}");
    loop {
        if report.batches > 0 && !config.pause.is_zero() {
            tokio::time::sleep(config.pause).await;
        }

        let window = store.window(audit_table).await?;
        let (Some(min), Some(max)) = (window.min, window.max) else {
            break;
        };
        if window.count <= 1 {
            break;
        }

        let delmax = min.saturating_add(batch_size).min(max);
        let deleted = store.delete_range(audit_table, min, delmax).await?;
        debug!(
            "Deleted {deleted} rows of {audit_table} with {min} <= audit_pk < {delmax} ({} rows, max {max})",
            window.count
        );

        report.batches += 1;
        report.deleted += deleted;
    }

    info!(
        "Wiped {} rows of {audit_table} in {} batches",
        report.deleted, report.batches
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use audit_core::AuditError;

    fn fast() -> WipeConfig {
        WipeConfig {
            batch_size: 100,
            pause: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_wipe_leaves_only_newest_row() {
        let pks: Vec<i64> = (1..=250).collect();
        let mut store = MemoryStore::with_users_audit(&pks);

        let report = wipe_table(&mut store, "users_audit", &fast()).await.unwrap();

        assert_eq!(store.pks("users_audit"), vec![250]);
        assert_eq!(report.deleted, 249);
        assert_eq!(store.deletes, vec![(1, 101), (101, 201), (201, 250)]);
    }

    #[tokio::test]
    async fn test_wipe_with_sparse_keys() {
        let mut store = MemoryStore::with_users_audit(&[5, 900, 901, 5000]);

        wipe_table(&mut store, "users_audit", &fast()).await.unwrap();

        assert_eq!(store.pks("users_audit"), vec![5000]);
    }

    #[tokio::test]
    async fn test_wipe_of_single_row_or_empty_table_is_noop() {
        let mut store = MemoryStore::with_users_audit(&[7]);
        let report = wipe_table(&mut store, "users_audit", &fast()).await.unwrap();
        assert_eq!(report, WipeReport::default());
        assert_eq!(store.pks("users_audit"), vec![7]);

        let mut store = MemoryStore::with_users_audit(&[]);
        let report = wipe_table(&mut store, "users_audit", &fast()).await.unwrap();
        assert_eq!(report, WipeReport::default());
        assert!(store.deletes.is_empty());
    }

    #[tokio::test]
    async fn test_wipe_tolerates_concurrent_inserts() {
        let pks: Vec<i64> = (1..=150).collect();
        let mut store = MemoryStore::with_users_audit(&pks);
        store.concurrent_inserts.extend([151, 152, 400]);

        wipe_table(&mut store, "users_audit", &fast()).await.unwrap();

        assert_eq!(store.pks("users_audit"), vec![400]);
    }

    #[tokio::test]
    async fn test_statistics_are_reread_every_batch() {
        let pks: Vec<i64> = (1..=30).collect();
        let mut store = MemoryStore::with_users_audit(&pks);
        let config = WipeConfig {
            batch_size: 10,
            pause: Duration::ZERO,
        };

        let report = wipe_table(&mut store, "users_audit", &config).await.unwrap();

        assert_eq!(report.batches, 3);
        // one read per batch plus the final read that ends the loop
        assert_eq!(store.window_calls, 4);
    }

    #[tokio::test]
    async fn test_delete_failure_aborts_wipe() {
        let mut store = MemoryStore::with_users_audit(&[1, 2, 3]);
        store.fail_delete = true;

        let err = wipe_table(&mut store, "users_audit", &fast()).await.unwrap_err();

        assert!(matches!(err, AuditError::Query { .. }));
        assert_eq!(store.pks("users_audit"), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_batches() {
        let pks: Vec<i64> = (1..=3).collect();
        let mut store = MemoryStore::with_users_audit(&pks);
        let config = WipeConfig {
            batch_size: 1,
            pause: Duration::from_secs(1),
        };

        let started = tokio::time::Instant::now();
        let report = wipe_table(&mut store, "users_audit", &config).await.unwrap();

        assert_eq!(report.batches, 2);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
