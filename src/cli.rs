use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::wallet_service::{self, ViewTarget};
use chrono::Local;
use clap::{Parser, Subcommand};
use photo_store::{PhotoSummary, PhotoWallet};
use std::path::PathBuf;
use uuid::Uuid;

/// Offline personal photo wallet
#[derive(Parser, Debug)]
#[command(name = "photowallet")]
#[command(version)]
pub struct Cli {
    /// Path to photowallet.toml
    #[arg(short, long, env = "PHOTOWALLET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the photos in the wallet
    List {
        #[arg(long)]
        json: bool,
    },
    /// Add photos (JPEG, PNG or WebP)
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Move a photo from the wallet to the overflow folder
    Remove { id: Uuid },
    /// Show the overflow folder
    Archived {
        #[arg(long)]
        json: bool,
    },
    /// Move a photo from the overflow folder back into the wallet
    Restore { id: Uuid },
    /// Delete a photo for good
    Purge {
        id: Uuid,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Empty the wallet; photos stay in the overflow folder
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Delete all photos, the overflow folder, settings and cached files
    Nuke {
        #[arg(long)]
        yes: bool,
    },
    /// Open a photo full-screen (replaces the previous view in the cache)
    View {
        id: Uuid,
        /// Print a data URL instead of writing to the view cache
        #[arg(long)]
        data_url: bool,
    },
}

fn require_confirmation(yes: bool, what: &str) -> Result<(), AppError> {
    if yes {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{} cannot be undone. Pass --yes to confirm.",
            what
        )))
    }
}

fn print_summaries(summaries: &[PhotoSummary], json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }

    for (i, photo) in summaries.iter().enumerate() {
        println!(
            "{:>3}  {}  {}  {} KiB  {}",
            i + 1,
            photo.id,
            photo.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            photo.size_bytes.div_ceil(1024),
            photo.filename
        );
    }
    Ok(())
}

/// Runs one command against the wallet
pub async fn execute(
    command: Command,
    wallet: &mut PhotoWallet,
    config: &AppConfig,
) -> Result<(), AppError> {
    match command {
        Command::List { json } => {
            let photos = wallet_service::active_summaries(wallet);
            if !json {
                println!("{} / {} photos", photos.len(), wallet.max_photos());
            }
            print_summaries(&photos, json)?;
        }
        Command::Add { files } => {
            let report = wallet_service::add_files(wallet, files).await?;
            for line in wallet_service::describe_batch(&report) {
                println!("{}", line);
            }
            println!("{} / {} photos", wallet.photos().len(), wallet.max_photos());
        }
        Command::Remove { id } => {
            let next = wallet_service::remove_photo(wallet, &id, config).await?;
            println!("Moved {} to the overflow folder", id);
            if let Some(next) = next {
                println!("  next: {}", next);
            }
        }
        Command::Archived { json } => {
            let photos = wallet_service::archived_summaries(wallet).await?;
            if !json {
                println!("{} photo(s) in the overflow folder", photos.len());
            }
            print_summaries(&photos, json)?;
        }
        Command::Restore { id } => {
            wallet_service::restore_photo(wallet, &id).await?;
            println!("Restored {}", id);
        }
        Command::Purge { id, yes } => {
            require_confirmation(yes, "Deleting a photo")?;
            wallet_service::purge_photo(wallet, &id, config).await?;
            println!("Deleted {}", id);
        }
        Command::Reset { yes } => {
            require_confirmation(yes, "Emptying the wallet")?;
            let report = wallet_service::reset_wallet(wallet).await?;
            println!(
                "Moved {} photo(s) to the overflow folder",
                report.affected
            );
            for e in &report.failures {
                eprintln!("  {}", e);
            }
        }
        Command::Nuke { yes } => {
            require_confirmation(yes, "The nuclear reset")?;
            let report = wallet_service::nuclear_reset(wallet, config).await;
            println!(
                "Removed {} photo(s) and {} setting(s){}",
                report.photos_removed,
                report.settings_cleared,
                if report.cache_cleared { ", emptied the view cache" } else { "" }
            );
            if !report.errors.is_empty() {
                for e in &report.errors {
                    eprintln!("  {}", e.user_message());
                }
                return Err(AppError::Other(format!(
                    "Reset finished with {} error(s)",
                    report.errors.len()
                )));
            }
        }
        Command::View { id, data_url } => {
            let view = wallet_service::export_view(wallet, &id, config, data_url)?;
            match &view.target {
                ViewTarget::CacheFile(path) => {
                    println!("{} of {}: {}", view.index + 1, view.total, path.display())
                }
                ViewTarget::DataUrl(url) => {
                    println!("{} of {}", view.index + 1, view.total);
                    println!("{}", url);
                }
            }
            if let Some(prev) = view.previous {
                println!("  previous: {}", prev);
            }
            if let Some(next) = view.next {
                println!("  next:     {}", next);
            }
        }
    }

    Ok(())
}
