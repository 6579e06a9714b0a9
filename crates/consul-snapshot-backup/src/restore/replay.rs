//! Writes a loaded snapshot back into the store.

use consul_snapshot_core::{Error, Result, Snapshot, StoreClient};
use tracing::{info, warn};

/// Outcome of replaying a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub kv_restored: usize,
    pub kv_failed: usize,
    /// Prepared queries present in the archive but not restored
    pub pq_skipped: usize,
    /// ACL entries present in the archive but not restored
    pub acl_skipped: usize,
}

impl RestoreReport {
    /// `Err(PartialRestore)` if any key failed, else the report itself.
    pub fn into_result(self) -> Result<Self> {
        if self.kv_failed > 0 {
            return Err(Error::PartialRestore {
                failed: self.kv_failed,
                succeeded: self.kv_restored,
            });
        }
        Ok(self)
    }
}

/// Replays KV entries one `put` at a time.
pub struct Restorer<'a> {
    store: &'a dyn StoreClient,
}

impl<'a> Restorer<'a> {
    pub fn new(store: &'a dyn StoreClient) -> Self {
        Self { store }
    }

    /// Restores every key, continuing past individual failures.
    ///
    /// Prepared queries and ACLs are reported as skipped; restoring them is
    /// not supported.
    pub async fn restore(&self, snapshot: &Snapshot) -> RestoreReport {
        let mut report = RestoreReport::default();

        for entry in &snapshot.kv {
            match self.store.put_kv(entry).await {
                Ok(()) => report.kv_restored += 1,
                Err(e) => {
                    warn!("Unable to restore key {}: {}", entry.key, e);
                    report.kv_failed += 1;
                }
            }
        }
        info!(
            "Restored {} keys with {} errors",
            report.kv_restored, report.kv_failed
        );

        report.pq_skipped = snapshot.prepared_queries.len();
        if report.pq_skipped > 0 {
            warn!(
                "Restoring prepared queries is currently unsupported; {} found in archive were not restored",
                report.pq_skipped
            );
        }

        report.acl_skipped = snapshot.acls.len();
        if report.acl_skipped > 0 {
            warn!(
                "Restoring ACLs is currently unsupported; {} found in archive were not restored",
                report.acl_skipped
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report_is_ok() {
        let report = RestoreReport {
            kv_restored: 3,
            ..Default::default()
        };
        assert_eq!(report.clone().into_result().unwrap(), report);
    }

    #[test]
    fn test_failures_become_partial_restore() {
        let report = RestoreReport {
            kv_restored: 7,
            kv_failed: 3,
            ..Default::default()
        };
        match report.into_result() {
            Err(Error::PartialRestore { failed, succeeded }) => {
                assert_eq!(failed, 3);
                assert_eq!(succeeded, 7);
            }
            other => panic!("expected partial restore, got {:?}", other),
        }
    }

    #[test]
    fn test_skipped_catalog_entries_are_not_failures() {
        let report = RestoreReport {
            kv_restored: 1,
            pq_skipped: 2,
            acl_skipped: 5,
            ..Default::default()
        };
        assert!(report.into_result().is_ok());
    }
}
