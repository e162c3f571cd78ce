//! # Photo Store
//!
//! Local, capacity-bounded storage for a personal photo wallet.
//!
//! Photos live in SQLite as blobs next to their metadata. Each photo is
//! either in the active collection, which never holds more than
//! [`PhotoStoreConfig::max_photos`] records, or in the archive, which keeps
//! everything removed from the wallet until it is purged or the whole store
//! is reset.
//!
//! - [`fingerprint`]: SHA-256 identity of a photo's bytes
//! - [`repository`]: plain CRUD over records, no policy
//! - [`lifecycle`]: capacity, duplicate detection, archive and restore
//! - [`store`]: [`PhotoWallet`], the cached active collection the UI reads
//! - [`viewer`]: full-screen navigation and scoped rendered views
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use photo_store::{PhotoStoreConfig, PhotoWallet, SelectedFile};
//!
//! let conn = rusqlite::Connection::open("wallet.db")?;
//! let mut wallet = PhotoWallet::new(conn, PhotoStoreConfig::default())?;
//! wallet.load().await?;
//!
//! let report = wallet
//!     .add_batch(vec![SelectedFile::from_path("/sdcard/DCIM/beach.jpg")])
//!     .await?;
//! println!("{} added, {} dropped", report.inserted_count(), report.dropped);
//! ```

pub mod error;
pub mod fingerprint;
pub mod intake;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod schema;
pub mod store;
pub mod viewer;

pub use error::PhotoStoreError;
pub use fingerprint::Fingerprint;
pub use intake::{PhotoSource, SelectedFile};
pub use lifecycle::{BatchReport, ItemOutcome, ItemReport, LifecyclePolicy, ResetReport};
pub use models::{
    PhotoBlob, PhotoRecord, PhotoStatus, PhotoStoreConfig, PhotoSummary, DEFAULT_MAX_PHOTOS,
};
pub use schema::init_photo_store_schema;
pub use store::PhotoWallet;
pub use viewer::{
    blob_to_data_url, neighbour_after_removal, BlobView, ViewRegistry, ViewerSession,
};
