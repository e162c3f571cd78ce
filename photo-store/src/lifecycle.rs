//! Capacity and duplicate policy.
//!
//! This is the only place that decides whether a selected file becomes a
//! record, and the only place that moves records between the active
//! collection and the archive.

use crate::error::PhotoStoreError;
use crate::intake::{self, SelectedFile};
use crate::models::{PhotoRecord, PhotoStatus, PhotoStoreConfig};
use crate::repository;
use rusqlite::Connection;
use uuid::Uuid;

/// What happened to one file of a batch
#[derive(Debug)]
pub enum ItemOutcome {
    Inserted(Uuid),
    /// An active record already holds identical bytes; no slot was used
    DuplicateSkipped { existing: Uuid },
    Failed(PhotoStoreError),
}

#[derive(Debug)]
pub struct ItemReport {
    pub filename: String,
    pub outcome: ItemOutcome,
}

/// Result of [`LifecyclePolicy::submit_batch`]
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Ceiling in force for this batch
    pub limit: usize,
    /// Files cut off the end of the selection because there was no room
    pub dropped: usize,
    /// One entry per processed file, in selection order
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn inserted(&self) -> Vec<Uuid> {
        self.items
            .iter()
            .filter_map(|item| match item.outcome {
                ItemOutcome::Inserted(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted().len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::DuplicateSkipped { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &PhotoStoreError)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Failed(e) => Some((item.filename.as_str(), e)),
            _ => None,
        })
    }

    /// No truncation and no per-file failure
    pub fn is_clean(&self) -> bool {
        self.dropped == 0 && self.failures().next().is_none()
    }
}

/// Result of a reset. Resets keep going past individual failures.
#[derive(Debug, Default)]
pub struct ResetReport {
    /// Records archived or removed
    pub affected: usize,
    pub failures: Vec<PhotoStoreError>,
}

impl ResetReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Lifecycle policy over the photo repository
pub struct LifecyclePolicy {
    config: PhotoStoreConfig,
}

impl LifecyclePolicy {
    pub fn new(config: PhotoStoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhotoStoreConfig {
        &self.config
    }

    pub fn max_photos(&self) -> usize {
        self.config.max_photos
    }

    pub fn count_active(&self, conn: &Connection) -> Result<usize, PhotoStoreError> {
        repository::count_by_status(conn, PhotoStatus::Active)
    }

    pub fn remaining_slots(&self, conn: &Connection) -> Result<usize, PhotoStoreError> {
        Ok(self.max_photos().saturating_sub(self.count_active(conn)?))
    }

    /// Adds a user selection to the active collection.
    ///
    /// A full collection rejects the whole selection before anything is
    /// read. Otherwise the selection is cut to the free slots and processed
    /// one file at a time; each file is checked against the active set for
    /// duplicates and the ceiling is re-read right before every insert.
    /// A failing file is reported and the next one is processed.
    pub async fn submit_batch(
        &self,
        conn: &Connection,
        files: Vec<SelectedFile>,
    ) -> Result<BatchReport, PhotoStoreError> {
        let limit = self.max_photos();
        let requested = files.len();
        let remaining = self.remaining_slots(conn)?;

        if requested == 0 {
            return Ok(BatchReport {
                limit,
                ..BatchReport::default()
            });
        }

        if remaining == 0 {
            log::warn!(
                "Wallet full ({} photos), rejecting {} file(s)",
                limit,
                requested
            );
            return Err(PhotoStoreError::CapacityExceeded {
                limit,
                rejected: requested,
            });
        }

        let dropped = requested.saturating_sub(remaining);
        if dropped > 0 {
            log::info!(
                "Only {} slot(s) left, dropping {} of {} file(s)",
                remaining,
                dropped,
                requested
            );
        }

        let mut report = BatchReport {
            limit,
            dropped,
            items: Vec::with_capacity(requested - dropped),
        };

        for file in files.into_iter().take(remaining) {
            let filename = file.filename.clone();
            let outcome = match self.insert_one(conn, file).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("Failed to add {}: {}", filename, e);
                    ItemOutcome::Failed(e)
                }
            };
            report.items.push(ItemReport { filename, outcome });
        }

        log::info!(
            "Batch done: {} added, {} duplicate(s), {} dropped",
            report.inserted_count(),
            report.duplicate_count(),
            report.dropped
        );

        Ok(report)
    }

    async fn insert_one(
        &self,
        conn: &Connection,
        file: SelectedFile,
    ) -> Result<ItemOutcome, PhotoStoreError> {
        let prepared = intake::prepare(file, self.config.accepted_formats.clone()).await?;

        if let Some(existing) =
            repository::find_by_fingerprint(conn, PhotoStatus::Active, &prepared.fingerprint)?
        {
            log::debug!(
                "{} duplicates active photo {}, skipping",
                prepared.filename,
                existing
            );
            return Ok(ItemOutcome::DuplicateSkipped { existing });
        }

        // The count is the authoritative gate; an earlier estimate may be stale
        if self.count_active(conn)? >= self.max_photos() {
            return Err(PhotoStoreError::CapacityExceeded {
                limit: self.max_photos(),
                rejected: 1,
            });
        }

        let record = PhotoRecord::new_active(prepared.filename, prepared.blob, prepared.fingerprint);
        repository::put(conn, &record)?;

        log::debug!("Added {} as {}", record.filename, record.id);
        Ok(ItemOutcome::Inserted(record.id))
    }

    /// Moves a record to the archive. Never limited by capacity.
    pub async fn archive(&self, conn: &Connection, id: &Uuid) -> Result<(), PhotoStoreError> {
        repository::set_status(conn, id, PhotoStatus::Archived)?;
        log::info!("Archived photo {}", id);
        Ok(())
    }

    /// Moves an archived record back into the active collection, subject to
    /// the same ceiling as new photos. Restoring an active record is a no-op.
    pub async fn restore(&self, conn: &Connection, id: &Uuid) -> Result<(), PhotoStoreError> {
        let record = repository::get(conn, id)?.ok_or(PhotoStoreError::NotFound(*id))?;

        if record.is_active() {
            return Ok(());
        }

        if self.remaining_slots(conn)? == 0 {
            log::warn!("Cannot restore {}: wallet is full", id);
            return Err(PhotoStoreError::CapacityExceeded {
                limit: self.max_photos(),
                rejected: 1,
            });
        }

        repository::set_status(conn, id, PhotoStatus::Active)?;
        log::info!("Restored photo {}", id);
        Ok(())
    }

    /// Removes a record of either status for good
    pub async fn delete_permanently(
        &self,
        conn: &Connection,
        id: &Uuid,
    ) -> Result<(), PhotoStoreError> {
        if !repository::delete(conn, id)? {
            return Err(PhotoStoreError::NotFound(*id));
        }
        log::info!("Permanently deleted photo {}", id);
        Ok(())
    }

    /// Archives every active record
    pub async fn reset_active(&self, conn: &Connection) -> Result<ResetReport, PhotoStoreError> {
        let active = repository::list_ids_by_status(conn, PhotoStatus::Active)?;
        let mut report = ResetReport::default();

        for id in active {
            match repository::set_status(conn, &id, PhotoStatus::Archived) {
                Ok(()) => report.affected += 1,
                Err(e) => {
                    log::warn!("Reset could not archive {}: {}", id, e);
                    report.failures.push(e);
                }
            }
        }

        log::info!(
            "Reset archived {} photo(s), {} failure(s)",
            report.affected,
            report.failures.len()
        );
        Ok(report)
    }

    /// Removes every record, archived ones included. If the bulk delete
    /// fails, records are removed one at a time so as little as possible
    /// is left behind.
    pub async fn reset_all(&self, conn: &Connection) -> Result<ResetReport, PhotoStoreError> {
        match repository::clear(conn) {
            Ok(removed) => Ok(ResetReport {
                affected: removed,
                failures: Vec::new(),
            }),
            Err(e) => {
                log::warn!("Bulk clear failed ({}), deleting one by one", e);
                let mut report = ResetReport {
                    affected: 0,
                    failures: vec![e],
                };

                for id in repository::list_ids(conn)? {
                    match repository::delete(conn, &id) {
                        Ok(true) => report.affected += 1,
                        Ok(false) => {}
                        Err(e) => {
                            log::warn!("Could not delete {}: {}", id, e);
                            report.failures.push(e);
                        }
                    }
                }

                Ok(report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::fixtures::jpeg;
    use crate::schema::init_photo_store_schema;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_photo_store_schema(&conn).unwrap();
        conn
    }

    fn files(seeds: &[u8]) -> Vec<SelectedFile> {
        seeds
            .iter()
            .map(|s| SelectedFile::from_bytes(format!("photo-{}.jpg", s), jpeg(*s)))
            .collect()
    }

    async fn fill(policy: &LifecyclePolicy, conn: &Connection, seeds: &[u8]) -> Vec<Uuid> {
        policy
            .submit_batch(conn, files(seeds))
            .await
            .unwrap()
            .inserted()
    }

    #[tokio::test]
    async fn test_full_wallet_rejects_whole_batch() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::with_max_photos(5));
        fill(&policy, &conn, &[1, 2, 3, 4, 5]).await;

        let err = policy
            .submit_batch(&conn, files(&[6, 7, 8]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PhotoStoreError::CapacityExceeded {
                limit: 5,
                rejected: 3
            }
        ));
        assert_eq!(policy.count_active(&conn).unwrap(), 5);
        assert_eq!(repository::list_ids(&conn).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_batch_truncated_to_free_slots() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::with_max_photos(5));
        fill(&policy, &conn, &[1, 2, 3]).await;

        let report = policy
            .submit_batch(&conn, files(&[4, 5, 6, 7]))
            .await
            .unwrap();

        assert_eq!(report.inserted_count(), 2);
        assert_eq!(report.dropped, 2);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].filename, "photo-4.jpg");
        assert_eq!(report.items[1].filename, "photo-5.jpg");
        assert!(!report.is_clean());
        assert_eq!(policy.count_active(&conn).unwrap(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_is_skipped_silently() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let first = fill(&policy, &conn, &[1]).await;

        let report = policy.submit_batch(&conn, files(&[1])).await.unwrap();

        assert_eq!(report.inserted_count(), 0);
        assert_eq!(report.duplicate_count(), 1);
        assert!(report.is_clean());
        assert!(matches!(
            report.items[0].outcome,
            ItemOutcome::DuplicateSkipped { existing } if existing == first[0]
        ));
        assert_eq!(policy.count_active(&conn).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_within_one_batch() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());

        let report = policy.submit_batch(&conn, files(&[3, 3])).await.unwrap();

        assert_eq!(report.inserted_count(), 1);
        assert_eq!(report.duplicate_count(), 1);
    }

    #[tokio::test]
    async fn test_archived_duplicate_may_reenter() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let first = fill(&policy, &conn, &[1]).await;
        policy.archive(&conn, &first[0]).await.unwrap();

        let second = fill(&policy, &conn, &[1]).await;

        assert_eq!(second.len(), 1);
        assert_ne!(first[0], second[0]);
        let archived = repository::get(&conn, &first[0]).unwrap().unwrap();
        let active = repository::get(&conn, &second[0]).unwrap().unwrap();
        assert_eq!(archived.status, PhotoStatus::Archived);
        assert_eq!(active.status, PhotoStatus::Active);
        assert_eq!(archived.fingerprint, active.fingerprint);
    }

    #[tokio::test]
    async fn test_failed_item_does_not_abort_batch() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let dir = tempfile::tempdir().unwrap();

        let batch = vec![
            SelectedFile::from_bytes("one.jpg", jpeg(1)),
            SelectedFile::from_path(dir.path().join("missing.jpg")),
            SelectedFile::from_bytes("notes.txt", b"plain text".to_vec()),
            SelectedFile::from_bytes("two.jpg", jpeg(2)),
        ];
        let report = policy.submit_batch(&conn, batch).await.unwrap();

        assert_eq!(report.inserted_count(), 2);
        let failed: Vec<&str> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, vec!["missing.jpg", "notes.txt"]);
        assert_eq!(policy.count_active(&conn).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_per_item_recheck_stops_at_ceiling() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::with_max_photos(2));
        fill(&policy, &conn, &[1, 2]).await;

        // The gate right before the write must hold even when the batch-level
        // estimate let the file through
        let err = policy
            .insert_one(&conn, SelectedFile::from_bytes("late.jpg", jpeg(3)))
            .await
            .unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(policy.count_active(&conn).unwrap(), 2);

        // Duplicates are recognised before the gate and use no slot
        let outcome = policy
            .insert_one(&conn, SelectedFile::from_bytes("again.jpg", jpeg(1)))
            .await
            .unwrap();
        assert!(matches!(outcome, ItemOutcome::DuplicateSkipped { .. }));
    }

    #[tokio::test]
    async fn test_active_count_never_exceeds_ceiling() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::with_max_photos(4));

        for round in 0..6u8 {
            let seeds: Vec<u8> = (0..3).map(|i| round * 3 + i).collect();
            let _ = policy.submit_batch(&conn, files(&seeds)).await;
            assert!(policy.count_active(&conn).unwrap() <= 4);
        }
        assert_eq!(policy.count_active(&conn).unwrap(), 4);
    }

    #[tokio::test]
    async fn test_archive_missing_is_not_found() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        fill(&policy, &conn, &[1]).await;

        let err = policy.archive(&conn, &Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(policy.count_active(&conn).unwrap(), 1);
        assert_eq!(
            repository::count_by_status(&conn, PhotoStatus::Archived).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_archive_then_restore() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let ids = fill(&policy, &conn, &[1, 2]).await;

        policy.archive(&conn, &ids[0]).await.unwrap();
        assert_eq!(policy.count_active(&conn).unwrap(), 1);

        policy.restore(&conn, &ids[0]).await.unwrap();
        assert_eq!(policy.count_active(&conn).unwrap(), 2);
        assert!(repository::get(&conn, &ids[0]).unwrap().unwrap().is_active());
    }

    #[tokio::test]
    async fn test_restore_respects_ceiling() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::with_max_photos(2));
        let ids = fill(&policy, &conn, &[1, 2]).await;
        policy.archive(&conn, &ids[0]).await.unwrap();
        fill(&policy, &conn, &[3]).await;

        let err = policy.restore(&conn, &ids[0]).await.unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(
            repository::get(&conn, &ids[0]).unwrap().unwrap().status,
            PhotoStatus::Archived
        );
    }

    #[tokio::test]
    async fn test_restore_missing_is_not_found() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let err = policy.restore(&conn, &Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_permanently() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let ids = fill(&policy, &conn, &[1, 2]).await;
        policy.archive(&conn, &ids[1]).await.unwrap();

        policy.delete_permanently(&conn, &ids[0]).await.unwrap();
        policy.delete_permanently(&conn, &ids[1]).await.unwrap();

        assert!(repository::list_ids(&conn).unwrap().is_empty());
        assert!(policy
            .delete_permanently(&conn, &ids[0])
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_reset_active_keeps_records_in_archive() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        fill(&policy, &conn, &[1, 2, 3]).await;

        let report = policy.reset_active(&conn).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.affected, 3);
        assert_eq!(policy.count_active(&conn).unwrap(), 0);
        assert_eq!(
            repository::count_by_status(&conn, PhotoStatus::Archived).unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_reset_all_clears_archive_too() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let ids = fill(&policy, &conn, &[1, 2]).await;
        policy.archive(&conn, &ids[0]).await.unwrap();

        let report = policy.reset_all(&conn).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.affected, 2);
        assert!(repository::list_ids(&conn).unwrap().is_empty());
    }

    /// Makes every statement of `kind` touching `filename` abort
    fn fail_writes(conn: &Connection, kind: &str, filename: &str) {
        let row = if kind == "INSERT" { "NEW" } else { "OLD" };
        conn.execute_batch(&format!(
            "CREATE TRIGGER fail_{kind} BEFORE {kind} ON wallet_photos
             WHEN {row}.filename = '{filename}'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;"
        ))
        .unwrap();
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_per_item() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        fail_writes(&conn, "INSERT", "photo-2.jpg");

        let report = policy
            .submit_batch(&conn, files(&[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(report.inserted_count(), 2);
        let failures: Vec<(&str, &PhotoStoreError)> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "photo-2.jpg");
        assert!(matches!(failures[0].1, PhotoStoreError::Storage(_)));
        assert_eq!(policy.count_active(&conn).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reset_active_collects_failures() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let ids = fill(&policy, &conn, &[1, 2, 3]).await;
        fail_writes(&conn, "UPDATE", "photo-2.jpg");

        let report = policy.reset_active(&conn).await.unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.affected, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], PhotoStoreError::Storage(_)));
        assert_eq!(
            repository::list_ids_by_status(&conn, PhotoStatus::Active).unwrap(),
            vec![ids[1]]
        );
    }

    #[tokio::test]
    async fn test_reset_all_falls_back_to_single_deletes() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::default());
        let ids = fill(&policy, &conn, &[1, 2]).await;
        policy.archive(&conn, &ids[0]).await.unwrap();
        fail_writes(&conn, "DELETE", "photo-2.jpg");

        let report = policy.reset_all(&conn).await.unwrap();

        // The bulk delete and the protected record each report a failure
        assert_eq!(report.affected, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(repository::list_ids(&conn).unwrap(), vec![ids[1]]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let conn = setup_test_db();
        let policy = LifecyclePolicy::new(PhotoStoreConfig::with_max_photos(1));
        fill(&policy, &conn, &[1]).await;

        let report = policy.submit_batch(&conn, Vec::new()).await.unwrap();
        assert!(report.items.is_empty());
        assert!(report.is_clean());
    }
}
