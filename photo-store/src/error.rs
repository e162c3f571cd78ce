use uuid::Uuid;

/// Error type for photo store operations
#[derive(Debug)]
pub enum PhotoStoreError {
    /// The active collection has no room left for the requested photos
    CapacityExceeded { limit: usize, rejected: usize },
    /// No record with this id exists
    NotFound(Uuid),
    /// The database rejected a read or write (full, unavailable, corrupt)
    Storage(rusqlite::Error),
    /// A selected file could not be read
    UnreadableInput {
        filename: String,
        source: std::io::Error,
    },
    /// The selected file is not one of the accepted image formats
    UnsupportedFormat {
        filename: String,
        detected: Option<String>,
    },
    /// A blocking worker task died before finishing
    Task(String),
}

impl std::fmt::Display for PhotoStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoStoreError::CapacityExceeded { limit, rejected } => write!(
                f,
                "Wallet is full ({} photos), {} photo(s) not added",
                limit, rejected
            ),
            PhotoStoreError::NotFound(id) => write!(f, "Photo not found: {}", id),
            PhotoStoreError::Storage(e) => write!(f, "Storage error: {}", e),
            PhotoStoreError::UnreadableInput { filename, source } => {
                write!(f, "Could not read {}: {}", filename, source)
            }
            PhotoStoreError::UnsupportedFormat { filename, detected } => match detected {
                Some(format) => write!(f, "Unsupported image format for {}: {}", filename, format),
                None => write!(f, "{} is not a recognised image", filename),
            },
            PhotoStoreError::Task(msg) => write!(f, "Worker task failed: {}", msg),
        }
    }
}

impl std::error::Error for PhotoStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PhotoStoreError::Storage(e) => Some(e),
            PhotoStoreError::UnreadableInput { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for PhotoStoreError {
    fn from(err: rusqlite::Error) -> Self {
        PhotoStoreError::Storage(err)
    }
}

impl From<tokio::task::JoinError> for PhotoStoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        PhotoStoreError::Task(err.to_string())
    }
}

impl PhotoStoreError {
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, PhotoStoreError::CapacityExceeded { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PhotoStoreError::NotFound(_))
    }
}
