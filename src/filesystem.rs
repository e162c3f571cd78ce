use photo_store::PhotoBlob;
use std::fs;
use std::io::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File extension for the MIME types the wallet accepts
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Writes a photo into the view cache so an external viewer can open it.
/// The cache only ever holds the photo being viewed; older views are evicted.
pub fn write_cached_view(cache_dir: &Path, id: &Uuid, blob: &PhotoBlob) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir)?;
    evict_cached_views(cache_dir, None)?;

    let filepath = cache_dir.join(format!("{}.{}", id, extension_for_mime(&blob.mime_type)));
    fs::write(&filepath, &blob.data)?;

    Ok(filepath)
}

/// Removes cached views, only those of `id` when given. Returns how many
/// files were removed.
pub fn evict_cached_views(cache_dir: &Path, id: Option<&Uuid>) -> Result<usize> {
    if !cache_dir.exists() {
        return Ok(0);
    }

    let wanted = id.map(|id| id.to_string());
    let mut removed = 0;
    for entry in fs::read_dir(cache_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = match &wanted {
            Some(id) => path.file_stem().is_some_and(|stem| stem == id.as_str()),
            None => true,
        };
        if matches {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Deletes the view cache. Returns whether there was anything to delete.
pub fn clear_cache_dir(cache_dir: &Path) -> Result<bool> {
    if !cache_dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(cache_dir)?;
    Ok(true)
}
