use crate::error::AppError;
use photo_store::{PhotoStoreConfig, DEFAULT_MAX_PHOTOS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DATABASE_FILE: &str = "photowallet.db";
const CACHE_DIR: &str = "cache";

/// Settings read from `photowallet.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the database and the view cache
    pub data_dir: PathBuf,
    /// Ceiling for the active collection
    pub max_photos: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            max_photos: DEFAULT_MAX_PHOTOS,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from("./data/photowallet.toml")
    }

    /// Reads the config file; a missing file means defaults
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self, AppError> {
        let config: Self = toml::from_str(s).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_photos == 0 {
            return Err(AppError::Config(
                "max_photos must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR)
    }

    pub fn store_config(&self) -> PhotoStoreConfig {
        PhotoStoreConfig::with_max_photos(self.max_photos)
    }
}
