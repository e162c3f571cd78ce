use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default ceiling for the active collection
pub const DEFAULT_MAX_PHOTOS: usize = 50;

/// Which collection a photo belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PhotoStatus {
    Active,
    Archived,
}

impl PhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoStatus::Active => "active",
            PhotoStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PhotoStatus::Active),
            "archived" => Some(PhotoStatus::Archived),
            _ => None,
        }
    }
}

/// Raw image bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PhotoBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A stored photo. Only `status` ever changes after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: Uuid,
    pub blob: PhotoBlob,
    pub filename: String,
    pub fingerprint: Fingerprint,
    pub created_at: DateTime<Utc>,
    pub status: PhotoStatus,
}

impl PhotoRecord {
    /// Builds a fresh active record with a new id
    pub fn new_active(filename: String, blob: PhotoBlob, fingerprint: Fingerprint) -> Self {
        Self {
            id: Uuid::new_v4(),
            blob,
            filename,
            fingerprint,
            created_at: Utc::now(),
            status: PhotoStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PhotoStatus::Active
    }

    pub fn summary(&self) -> PhotoSummary {
        PhotoSummary {
            id: self.id,
            filename: self.filename.clone(),
            mime_type: self.blob.mime_type.clone(),
            size_bytes: self.blob.len(),
            fingerprint: self.fingerprint.clone(),
            created_at: self.created_at,
            status: self.status,
        }
    }
}

/// Record metadata without the blob, for listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoSummary {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub fingerprint: Fingerprint,
    pub created_at: DateTime<Utc>,
    pub status: PhotoStatus,
}

/// Configuration for the photo store
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoStoreConfig {
    /// Maximum number of active photos
    pub max_photos: usize,
    /// Formats the file picker accepts
    pub accepted_formats: Vec<ImageFormat>,
}

impl PhotoStoreConfig {
    pub fn with_max_photos(max_photos: usize) -> Self {
        Self {
            max_photos,
            ..Self::default()
        }
    }

    pub fn accepts(&self, format: ImageFormat) -> bool {
        self.accepted_formats.contains(&format)
    }
}

impl Default for PhotoStoreConfig {
    fn default() -> Self {
        Self {
            max_photos: DEFAULT_MAX_PHOTOS,
            accepted_formats: vec![ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP],
        }
    }
}
