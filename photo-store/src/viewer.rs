//! Full-screen viewing and the lifetime of rendered photo views.
//!
//! A [`BlobView`] is the renderable form of a stored blob (a `data:` URL).
//! It exists only while something displays it and is released on drop.
//! [`ViewerSession`] keeps views for the current photo and its direct
//! neighbours, so the number of live views follows what is on screen and
//! not the size of the collection.

use crate::error::PhotoStoreError;
use crate::models::{PhotoBlob, PhotoRecord};
use base64::Engine;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Renders a blob as a `data:` URL
pub fn blob_to_data_url(blob: &PhotoBlob) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(&blob.data);
    format!("data:{};base64,{}", blob.mime_type, b64)
}

/// Counts the views that are currently alive
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    live: Arc<AtomicUsize>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn acquire(&self, record: &PhotoRecord) -> BlobView {
        self.live.fetch_add(1, Ordering::SeqCst);
        BlobView {
            photo_id: record.id,
            url: blob_to_data_url(&record.blob),
            live: Arc::clone(&self.live),
        }
    }
}

/// A rendered photo; dropping it releases it
#[derive(Debug)]
pub struct BlobView {
    photo_id: Uuid,
    url: String,
    live: Arc<AtomicUsize>,
}

impl BlobView {
    pub fn photo_id(&self) -> Uuid {
        self.photo_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for BlobView {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Where the viewer goes once the photo `id` leaves the collection: the
/// photo after it, or the one before it when `id` was the last.
pub fn neighbour_after_removal(
    photos: &[PhotoRecord],
    id: &Uuid,
) -> Result<Option<Uuid>, PhotoStoreError> {
    let index = photos
        .iter()
        .position(|p| p.id == *id)
        .ok_or(PhotoStoreError::NotFound(*id))?;

    let neighbour = photos
        .get(index + 1)
        .or_else(|| index.checked_sub(1).and_then(|i| photos.get(i)));
    Ok(neighbour.map(|p| p.id))
}

/// Swipe-through viewer over the loaded active collection
pub struct ViewerSession<'a> {
    photos: &'a [PhotoRecord],
    index: usize,
    registry: ViewRegistry,
    views: Vec<BlobView>,
}

impl<'a> ViewerSession<'a> {
    /// Opens on `id`; an id that is not in the collection is `NotFound`
    pub fn open(
        photos: &'a [PhotoRecord],
        id: &Uuid,
        registry: &ViewRegistry,
    ) -> Result<Self, PhotoStoreError> {
        let index = photos
            .iter()
            .position(|p| p.id == *id)
            .ok_or(PhotoStoreError::NotFound(*id))?;

        let mut session = Self {
            photos,
            index,
            registry: registry.clone(),
            views: Vec::new(),
        };
        session.refresh_window();
        Ok(session)
    }

    pub fn current(&self) -> &PhotoRecord {
        &self.photos[self.index]
    }

    pub fn current_view(&self) -> Option<&BlobView> {
        let id = self.current().id;
        self.views.iter().find(|v| v.photo_id == id)
    }

    /// Zero-based index and collection size
    pub fn position(&self) -> (usize, usize) {
        (self.index, self.photos.len())
    }

    /// Moves one photo forward; stays put on the last one
    pub fn next(&mut self) -> bool {
        if self.index + 1 >= self.photos.len() {
            return false;
        }
        self.index += 1;
        self.refresh_window();
        true
    }

    /// Moves one photo back; stays put on the first one
    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.refresh_window();
        true
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.photos.len() {
            return false;
        }
        self.index = index;
        self.refresh_window();
        true
    }

    pub fn live_views(&self) -> usize {
        self.views.len()
    }

    fn window(&self) -> std::ops::RangeInclusive<usize> {
        let start = self.index.saturating_sub(1);
        let end = (self.index + 1).min(self.photos.len() - 1);
        start..=end
    }

    fn refresh_window(&mut self) {
        let photos = self.photos;
        let wanted: Vec<Uuid> = self.window().map(|i| photos[i].id).collect();

        self.views.retain(|v| wanted.contains(&v.photo_id));
        for i in self.window() {
            let record = &photos[i];
            if !self.views.iter().any(|v| v.photo_id == record.id) {
                self.views.push(self.registry.acquire(record));
            }
        }
    }
}
