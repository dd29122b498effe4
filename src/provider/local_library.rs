//! Directory-backed photo library.
//!
//! Threading model:
//! - `rayon::spawn`: decoding, XMP writes and file moves (blocking work)
//! - a one-shot `async_std::channel` carries each result back to the awaiting caller

use crate::config::{FAVORITE_RATING, SwipeSettings};
use crate::error::{AppError, Result};
use crate::file_utils::{self, PathExt};
use crate::image_cache::ImageCache;
use crate::image_loader;
use crate::metadata;
use crate::provider::{
    AssetHandle, AssetId, AssetProvider, AuthorizationState, PixelBuffer, TargetSize,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Photo library rooted at a directory on disk.
pub struct LocalLibrary {
    root: PathBuf,
    trash_dir: PathBuf,
    cache: Arc<Mutex<ImageCache>>,
}

/// Runs blocking work on the rayon pool and awaits its result.
///
/// A worker that panics or dies before replying is reported as a `fail` error.
async fn run_blocking<T, F>(fail: fn(String) -> AppError, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = async_std::channel::bounded(1);
    rayon::spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(work))
            .unwrap_or_else(|_| Err(fail("Worker panicked".to_string())));
        let _ = tx.try_send(result);
    });
    rx.recv()
        .await
        .map_err(|_| fail("Worker dropped its result".to_string()))?
}

impl LocalLibrary {
    /// Creates a library over `root`, with its trash directory and cache sized from settings.
    pub fn new(root: impl Into<PathBuf>, settings: &SwipeSettings) -> Self {
        let root = root.into();
        let trash_dir = root.join(&settings.trash_dir_name);
        Self {
            root,
            trash_dir,
            cache: Arc::new(Mutex::new(ImageCache::new(settings.cache_capacity))),
        }
    }

    pub fn trash_dir(&self) -> &Path {
        &self.trash_dir
    }

    fn handle_for(path: PathBuf, modified: std::time::SystemTime) -> AssetHandle {
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        AssetHandle {
            id: AssetId::new(id),
            path,
            created_at: DateTime::<Utc>::from(modified),
        }
    }

    fn cached(&self, id: &AssetId, size: TargetSize) -> Option<PixelBuffer> {
        self.cache.lock().ok().and_then(|mut c| c.get(id, size))
    }
}

/// Moves one file into the trash directory without overwriting anything there.
fn move_to_trash(path: &Path, trash_dir: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::Trash(format!("Not a file: {}", path.display())))?;
    let destination = file_utils::unique_destination(trash_dir, Path::new(file_name));
    fs::rename(path, &destination).map_err(|e| {
        AppError::Trash(format!("Failed to move {}: {}", path.display(), e))
    })?;
    Ok(destination)
}

/// Collapses per-file failures into a single batch error.
fn batch_result(kind: fn(String) -> AppError, failures: Vec<String>, total: usize) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(kind(format!(
            "{} of {} failed: {}",
            failures.len(),
            total,
            failures.join("; ")
        )))
    }
}

impl AssetProvider for LocalLibrary {
    async fn request_access(&self) -> AuthorizationState {
        let state = match fs::metadata(&self.root) {
            Err(_) => AuthorizationState::Denied,
            Ok(meta) if !meta.is_dir() => AuthorizationState::Restricted,
            Ok(meta) if meta.permissions().readonly() => AuthorizationState::Limited,
            Ok(_) => AuthorizationState::Authorized,
        };
        debug!("Access to {}: {:?}", self.root.display(), state);
        state
    }

    async fn fetch_assets(&self) -> Result<Vec<AssetHandle>> {
        let root = self.root.clone();
        let files =
            run_blocking(AppError::LibraryScan, move || file_utils::scan_directory(&root)).await?;

        let assets: Vec<AssetHandle> = files
            .into_iter()
            .map(|(path, modified)| Self::handle_for(path, modified))
            .collect();
        info!("Found {} photos in {}", assets.len(), self.root.display());
        Ok(assets)
    }

    async fn load_image(&self, handle: &AssetHandle, size: TargetSize) -> Result<PixelBuffer> {
        if let Some(pixels) = self.cached(&handle.id, size) {
            return Ok(pixels);
        }

        let path = handle.path.clone();
        let pixels = run_blocking(AppError::ImageLoad, move || {
            image_loader::load_image_blocking(&path, size)
        })
        .await?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(handle.id.clone(), size, pixels.clone());
        }
        Ok(pixels)
    }

    async fn apply_keep(&self, handles: &[AssetHandle]) -> Result<()> {
        if handles.is_empty() {
            return Ok(());
        }

        let paths: Vec<PathBuf> = handles.iter().map(|h| h.path.clone()).collect();
        let total = paths.len();
        let failures = run_blocking(AppError::XmpWrite, move || {
            let mut failures = Vec::new();
            for path in &paths {
                match metadata::mark_favorite(path, FAVORITE_RATING) {
                    Ok(true) => debug!("Marked favorite: {}", path.format_for_log()),
                    Ok(false) => debug!("Already favorite: {}", path.format_for_log()),
                    Err(e) => {
                        warn!("Failed to keep {}: {}", path.format_for_log(), e);
                        failures.push(format!("{}: {}", path.format_for_log(), e));
                    }
                }
            }
            Ok(failures)
        })
        .await?;

        batch_result(AppError::XmpWrite, failures, total)
    }

    async fn apply_trash(&self, handles: &[AssetHandle]) -> Result<()> {
        if handles.is_empty() {
            return Ok(());
        }

        let paths: Vec<PathBuf> = handles.iter().map(|h| h.path.clone()).collect();
        let trash_dir = self.trash_dir.clone();
        let total = paths.len();
        let failures = run_blocking(AppError::Trash, move || {
            fs::create_dir_all(&trash_dir).map_err(|e| {
                AppError::Trash(format!("Failed to create {}: {}", trash_dir.display(), e))
            })?;

            let mut failures = Vec::new();
            for path in &paths {
                match move_to_trash(path, &trash_dir) {
                    Ok(dest) => debug!("Trashed {} -> {}", path.format_for_log(), dest.display()),
                    Err(e) => {
                        warn!("{}", e);
                        failures.push(e.to_string());
                    }
                }
            }
            Ok(failures)
        })
        .await?;

        if let Ok(mut cache) = self.cache.lock() {
            for handle in handles {
                cache.evict(&handle.id);
            }
        }

        batch_result(AppError::Trash, failures, total)
    }

    fn prefetch(&self, handles: &[AssetHandle], size: TargetSize) {
        for handle in handles {
            let already = self
                .cache
                .lock()
                .map(|c| c.contains(&handle.id, size))
                .unwrap_or(true);
            if already {
                continue;
            }

            let cache = self.cache.clone();
            let id = handle.id.clone();
            let path = handle.path.clone();
            rayon::spawn(move || {
                // Silently ignore errors during prefetch
                if let Ok(pixels) = image_loader::load_image_blocking(&path, size) {
                    if let Ok(mut cache) = cache.lock() {
                        cache.put(id, size, pixels);
                    }
                }
            });
        }
    }
}
