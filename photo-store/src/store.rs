//! The read model the UI observes.
//!
//! [`PhotoWallet`] owns the database connection and the in-memory copy of
//! the active collection. Construct one at startup and hand out references;
//! there is no global instance.
//!
//! Every write goes through the lifecycle policy and is followed by a full
//! [`PhotoWallet::load`], so the cached collection is never patched by hand.

use crate::error::PhotoStoreError;
use crate::intake::SelectedFile;
use crate::lifecycle::{BatchReport, LifecyclePolicy, ResetReport};
use crate::models::{PhotoRecord, PhotoStatus, PhotoStoreConfig};
use crate::repository;
use crate::schema::init_photo_store_schema;
use crate::viewer::{self, ViewRegistry, ViewerSession};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use uuid::Uuid;

pub struct PhotoWallet {
    conn: Arc<Mutex<Connection>>,
    policy: LifecyclePolicy,
    photos: Vec<PhotoRecord>,
    loading: watch::Sender<bool>,
    views: ViewRegistry,
}

/// Raises the loading flag and lowers it again on drop, so a load that is
/// cancelled midway does not leave the flag up.
struct LoadingGuard<'a>(&'a watch::Sender<bool>);

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl PhotoWallet {
    /// Wraps an open connection, creating the schema if needed.
    /// The collection starts empty until [`PhotoWallet::load`] runs.
    pub fn new(conn: Connection, config: PhotoStoreConfig) -> Result<Self, PhotoStoreError> {
        init_photo_store_schema(&conn)?;
        let (loading, _) = watch::channel(false);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            policy: LifecyclePolicy::new(config),
            photos: Vec::new(),
            loading,
            views: ViewRegistry::new(),
        })
    }

    /// Active photos, oldest first
    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Follows the loading flag; it is `true` while a load is in flight
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn max_photos(&self) -> usize {
        self.policy.max_photos()
    }

    pub fn is_full(&self) -> bool {
        self.photos.len() >= self.max_photos()
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// The underlying connection, for tables the wallet does not own
    pub async fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    pub fn view_registry(&self) -> &ViewRegistry {
        &self.views
    }

    /// Replaces the cached collection with the active set from the database.
    /// The read runs on a blocking worker; the loading flag is up meanwhile.
    pub async fn load(&mut self) -> Result<(), PhotoStoreError> {
        let _loading = LoadingGuard::raise(&self.loading);

        let conn = Arc::clone(&self.conn);
        let mut photos = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            repository::list_by_status(&conn, PhotoStatus::Active)
        })
        .await??;

        // Stable sort: equal timestamps keep the repository's row order
        photos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        log::debug!("Loaded {} active photo(s)", photos.len());
        self.photos = photos;
        Ok(())
    }

    /// Reloads, then hands back the outcome of the write that preceded it.
    /// The write's error wins over a reload error.
    async fn reload_after<T>(
        &mut self,
        outcome: Result<T, PhotoStoreError>,
    ) -> Result<T, PhotoStoreError> {
        let reloaded = self.load().await;
        let value = outcome?;
        reloaded?;
        Ok(value)
    }

    pub async fn add(&mut self, file: SelectedFile) -> Result<BatchReport, PhotoStoreError> {
        self.add_batch(vec![file]).await
    }

    pub async fn add_batch(
        &mut self,
        files: Vec<SelectedFile>,
    ) -> Result<BatchReport, PhotoStoreError> {
        let outcome = {
            let conn = self.conn.lock().await;
            self.policy.submit_batch(&conn, files).await
        };
        self.reload_after(outcome).await
    }

    /// The UI's "remove from wallet": moves the photo to the archive.
    /// Nothing is destroyed; see [`PhotoWallet::purge`] for that.
    pub async fn soft_remove(&mut self, id: &Uuid) -> Result<(), PhotoStoreError> {
        self.archive(id).await
    }

    /// Soft removal from the full-screen viewer. Returns the photo the
    /// viewer should move to, or `None` when the wallet is now empty.
    pub async fn soft_remove_from_viewer(
        &mut self,
        id: &Uuid,
    ) -> Result<Option<Uuid>, PhotoStoreError> {
        let neighbour = viewer::neighbour_after_removal(&self.photos, id)?;
        self.soft_remove(id).await?;
        Ok(neighbour.filter(|n| self.photos.iter().any(|p| p.id == *n)))
    }

    pub async fn archive(&mut self, id: &Uuid) -> Result<(), PhotoStoreError> {
        let outcome = {
            let conn = self.conn.lock().await;
            self.policy.archive(&conn, id).await
        };
        self.reload_after(outcome).await
    }

    pub async fn restore(&mut self, id: &Uuid) -> Result<(), PhotoStoreError> {
        let outcome = {
            let conn = self.conn.lock().await;
            self.policy.restore(&conn, id).await
        };
        self.reload_after(outcome).await
    }

    /// Irreversible removal of an active or archived photo
    pub async fn purge(&mut self, id: &Uuid) -> Result<(), PhotoStoreError> {
        let outcome = {
            let conn = self.conn.lock().await;
            self.policy.delete_permanently(&conn, id).await
        };
        self.reload_after(outcome).await
    }

    /// Empties the active collection; the photos stay in the archive
    pub async fn clear_all(&mut self) -> Result<ResetReport, PhotoStoreError> {
        let outcome = {
            let conn = self.conn.lock().await;
            self.policy.reset_active(&conn).await
        };
        self.reload_after(outcome).await
    }

    /// Irreversible removal of every photo, archived ones included
    pub async fn reset_all(&mut self) -> Result<ResetReport, PhotoStoreError> {
        let outcome = {
            let conn = self.conn.lock().await;
            self.policy.reset_all(&conn).await
        };
        self.reload_after(outcome).await
    }

    /// Archived photos, oldest first
    pub async fn archived(&self) -> Result<Vec<PhotoRecord>, PhotoStoreError> {
        let conn = self.conn.lock().await;
        let mut archived = repository::list_by_status(&conn, PhotoStatus::Archived)?;
        archived.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(archived)
    }

    /// Looks a photo up in the database, whatever its status
    pub async fn find(&self, id: &Uuid) -> Result<Option<PhotoRecord>, PhotoStoreError> {
        let conn = self.conn.lock().await;
        repository::get(&conn, id)
    }

    /// Opens the full-screen viewer on a loaded active photo
    pub fn open_viewer(&self, id: &Uuid) -> Result<ViewerSession<'_>, PhotoStoreError> {
        ViewerSession::open(&self.photos, id, &self.views)
    }
}
