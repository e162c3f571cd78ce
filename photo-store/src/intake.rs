//! Turning a user-selected file into bytes, a MIME type and a fingerprint.

use crate::error::PhotoStoreError;
use crate::fingerprint::Fingerprint;
use crate::models::PhotoBlob;
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Where the bytes of a selected file come from
#[derive(Debug, Clone)]
pub enum PhotoSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A file the user picked, not read yet
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub filename: String,
    pub source: PhotoSource,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            filename,
            source: PhotoSource::Path(path),
        }
    }

    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            source: PhotoSource::Bytes(bytes),
        }
    }
}

/// A selected file after it was read, checked and fingerprinted
#[derive(Debug, Clone)]
pub struct PreparedPhoto {
    pub filename: String,
    pub blob: PhotoBlob,
    pub fingerprint: Fingerprint,
}

/// Reads, sniffs and fingerprints a file on a blocking worker.
/// A file on disk is read exactly once.
pub async fn prepare(
    file: SelectedFile,
    accepted: Vec<ImageFormat>,
) -> Result<PreparedPhoto, PhotoStoreError> {
    tokio::task::spawn_blocking(move || prepare_blocking(file, &accepted)).await?
}

fn prepare_blocking(
    file: SelectedFile,
    accepted: &[ImageFormat],
) -> Result<PreparedPhoto, PhotoStoreError> {
    let SelectedFile { filename, source } = file;

    let data = match source {
        PhotoSource::Path(path) => read_file(&filename, &path)?,
        PhotoSource::Bytes(bytes) => bytes,
    };

    if data.is_empty() {
        return Err(PhotoStoreError::UnreadableInput {
            filename,
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "file is empty"),
        });
    }

    let format = sniff_format(&filename, &data, accepted)?;
    let fingerprint = Fingerprint::of_bytes(&data);

    log::debug!(
        "Prepared {} ({} bytes, {}, {})",
        filename,
        data.len(),
        format.to_mime_type(),
        fingerprint.short()
    );

    Ok(PreparedPhoto {
        filename,
        blob: PhotoBlob {
            mime_type: format.to_mime_type().to_string(),
            data,
        },
        fingerprint,
    })
}

fn read_file(filename: &str, path: &Path) -> Result<Vec<u8>, PhotoStoreError> {
    std::fs::read(path).map_err(|source| {
        log::warn!("Failed to read {:?}: {}", path, source);
        PhotoStoreError::UnreadableInput {
            filename: filename.to_string(),
            source,
        }
    })
}

/// Detects the image format from magic bytes and checks it against the accepted list
pub fn sniff_format(
    filename: &str,
    data: &[u8],
    accepted: &[ImageFormat],
) -> Result<ImageFormat, PhotoStoreError> {
    match image::guess_format(data) {
        Ok(format) if accepted.contains(&format) => Ok(format),
        Ok(format) => Err(PhotoStoreError::UnsupportedFormat {
            filename: filename.to_string(),
            detected: Some(format.to_mime_type().to_string()),
        }),
        Err(_) => Err(PhotoStoreError::UnsupportedFormat {
            filename: filename.to_string(),
            detected: None,
        }),
    }
}
