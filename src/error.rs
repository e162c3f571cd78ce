use photo_store::PhotoStoreError;
use std::fmt;

/// Central error types for the photo wallet app
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Config file could not be parsed or holds invalid values
    Config(String),
    /// Photo store rejected the operation
    Store(PhotoStoreError),
    /// Validation error (e.g. invalid inputs, missing confirmation)
    Validation(String),
    /// Resource not found
    NotFound(String),
    /// General error
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<PhotoStoreError> for AppError {
    fn from(e: PhotoStoreError) -> Self {
        match e {
            PhotoStoreError::Storage(e) => AppError::Database(e),
            PhotoStoreError::NotFound(id) => AppError::NotFound(format!("Photo {}", id)),
            other => AppError::Store(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Other(format!("JSON error: {}", e))
    }
}

/// User-friendly error messages
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A storage error occurred. Please try again.".to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check permissions.".to_string()
            }
            AppError::Config(msg) => format!("Invalid configuration: {}", msg),
            AppError::Store(PhotoStoreError::CapacityExceeded { limit, rejected }) => format!(
                "Your wallet is full ({} photos). {} photo{} could not be added. \
                 Remove some photos before adding more.",
                limit,
                rejected,
                if *rejected == 1 { "" } else { "s" }
            ),
            AppError::Store(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => format!("{} was not found.", msg),
            AppError::Other(msg) => msg.clone(),
        }
    }
}
