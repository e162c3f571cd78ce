//! Wallet actions as the front end triggers them.
//!
//! Everything here receives the one [`PhotoWallet`] built in `main`.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::filesystem;
use crate::services::settings_service;
use photo_store::{BatchReport, ItemOutcome, PhotoSummary, PhotoWallet, ResetReport, SelectedFile};
use std::path::PathBuf;
use uuid::Uuid;

pub fn active_summaries(wallet: &PhotoWallet) -> Vec<PhotoSummary> {
    wallet.photos().iter().map(|p| p.summary()).collect()
}

pub async fn archived_summaries(wallet: &PhotoWallet) -> Result<Vec<PhotoSummary>, AppError> {
    Ok(wallet.archived().await?.iter().map(|p| p.summary()).collect())
}

/// Adds the selected files in selection order
pub async fn add_files(
    wallet: &mut PhotoWallet,
    paths: Vec<PathBuf>,
) -> Result<BatchReport, AppError> {
    let files = paths.into_iter().map(SelectedFile::from_path).collect();
    Ok(wallet.add_batch(files).await?)
}

/// One line per notable event of a batch
pub fn describe_batch(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.dropped > 0 {
        lines.push(format!(
            "Only {} more photo{} fit; your wallet limit is {} photos. {} file{} not added.",
            report.items.len(),
            if report.items.len() == 1 { "" } else { "s" },
            report.limit,
            report.dropped,
            if report.dropped == 1 { " was" } else { "s were" }
        ));
    }

    for item in &report.items {
        match &item.outcome {
            ItemOutcome::Inserted(id) => lines.push(format!("Added {} ({})", item.filename, id)),
            ItemOutcome::DuplicateSkipped { .. } => {
                lines.push(format!("Skipped {}: already in your wallet", item.filename))
            }
            ItemOutcome::Failed(e) => lines.push(format!("Could not add {}: {}", item.filename, e)),
        }
    }

    lines
}

/// "Remove from wallet": the photo goes to the overflow folder and its
/// cached view is dropped. Returns the photo to show next, if any.
pub async fn remove_photo(
    wallet: &mut PhotoWallet,
    id: &Uuid,
    config: &AppConfig,
) -> Result<Option<Uuid>, AppError> {
    let next = wallet.soft_remove_from_viewer(id).await?;
    filesystem::evict_cached_views(&config.cache_dir(), Some(id))?;
    Ok(next)
}

pub async fn restore_photo(wallet: &mut PhotoWallet, id: &Uuid) -> Result<(), AppError> {
    Ok(wallet.restore(id).await?)
}

/// Deletes a photo for good, including any copy in the view cache
pub async fn purge_photo(
    wallet: &mut PhotoWallet,
    id: &Uuid,
    config: &AppConfig,
) -> Result<(), AppError> {
    wallet.purge(id).await?;
    let evicted = filesystem::evict_cached_views(&config.cache_dir(), Some(id))?;
    if evicted > 0 {
        log::debug!("Evicted {} cached view(s) of {}", evicted, id);
    }
    Ok(())
}

pub async fn reset_wallet(wallet: &mut PhotoWallet) -> Result<ResetReport, AppError> {
    Ok(wallet.clear_all().await?)
}

#[derive(Debug, Default)]
pub struct NuclearResetReport {
    pub photos_removed: usize,
    pub settings_cleared: usize,
    pub cache_cleared: bool,
    pub errors: Vec<AppError>,
}

/// Wipes photos, archive, settings and the view cache. Every step runs
/// even if an earlier one failed.
pub async fn nuclear_reset(wallet: &mut PhotoWallet, config: &AppConfig) -> NuclearResetReport {
    log::info!("Starting nuclear reset");
    let mut report = NuclearResetReport::default();

    match wallet.reset_all().await {
        Ok(photos) => {
            report.photos_removed = photos.affected;
            report
                .errors
                .extend(photos.failures.into_iter().map(AppError::from));
        }
        Err(e) => report.errors.push(e.into()),
    }

    match settings_service::clear_settings(&*wallet.connection().await) {
        Ok(n) => report.settings_cleared = n,
        Err(e) => report.errors.push(e),
    }

    match filesystem::clear_cache_dir(&config.cache_dir()) {
        Ok(cleared) => report.cache_cleared = cleared,
        Err(e) => report.errors.push(e.into()),
    }

    if report.errors.is_empty() {
        log::info!("Nuclear reset complete");
    } else {
        log::warn!("Nuclear reset finished with {} error(s)", report.errors.len());
    }
    report
}

/// Where an opened photo can be picked up
#[derive(Debug)]
pub enum ViewTarget {
    /// Copy in the view cache, replaced by the next view
    CacheFile(PathBuf),
    /// Inline `data:` URL; nothing touches the disk
    DataUrl(String),
}

#[derive(Debug)]
pub struct ExportedView {
    pub target: ViewTarget,
    pub index: usize,
    pub total: usize,
    pub previous: Option<Uuid>,
    pub next: Option<Uuid>,
}

/// Opens the viewer on a photo and hands it out either as a data URL or
/// through the view cache
pub fn export_view(
    wallet: &PhotoWallet,
    id: &Uuid,
    config: &AppConfig,
    inline: bool,
) -> Result<ExportedView, AppError> {
    let session = wallet.open_viewer(id)?;
    let (index, total) = session.position();

    let target = if inline {
        let view = session
            .current_view()
            .ok_or_else(|| AppError::Other(format!("No rendered view for {}", id)))?;
        ViewTarget::DataUrl(view.url().to_string())
    } else {
        let record = session.current();
        ViewTarget::CacheFile(filesystem::write_cached_view(
            &config.cache_dir(),
            &record.id,
            &record.blob,
        )?)
    };

    let photos = wallet.photos();
    let previous = index.checked_sub(1).map(|i| photos[i].id);
    let next = photos.get(index + 1).map(|p| p.id);

    Ok(ExportedView {
        target,
        index,
        total,
        previous,
        next,
    })
}
