//! Application configuration constants and user-tunable swipe settings.

use crate::error::{AppError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Supported image file extensions for scanning the library.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Number of pending decisions that triggers an automatic batch commit.
pub const DEFAULT_COMMIT_THRESHOLD: usize = 10;

/// Horizontal drag distance (points) beyond which a release counts as a swipe.
pub const DEFAULT_SWIPE_DISTANCE_THRESHOLD: f32 = 100.0;

/// Velocity-projected end displacement (points) beyond which a release counts as a swipe.
pub const DEFAULT_SWIPE_VELOCITY_THRESHOLD: f32 = 300.0;

/// Decoded-image LRU capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Longest edge, in pixels, of the card image shown for the current asset.
pub const DEFAULT_DISPLAY_EDGE: u32 = 1024;

/// How many upcoming assets are decoded ahead of the cursor.
pub const DEFAULT_PREFETCH_AHEAD: usize = 2;

/// Directory (inside the library) that trashed files are moved into.
pub const DEFAULT_TRASH_DIR_NAME: &str = ".trash";

/// Undrained snapshots kept per session subscriber.
pub const SUBSCRIBER_BACKLOG: usize = 16;

/// XMP rating written for kept photos.
pub const FAVORITE_RATING: u8 = 5;

/// Settings for a swipe session and its library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeSettings {
    pub commit_threshold: usize,
    pub commit_on_threshold: bool,
    pub commit_on_deck_end: bool,
    pub swipe_distance_threshold: f32,
    pub swipe_velocity_threshold: f32,
    pub cache_capacity: usize,
    pub display_edge: u32,
    pub prefetch_ahead: usize,
    pub trash_dir_name: String,
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self {
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            commit_on_threshold: true,
            commit_on_deck_end: true,
            swipe_distance_threshold: DEFAULT_SWIPE_DISTANCE_THRESHOLD,
            swipe_velocity_threshold: DEFAULT_SWIPE_VELOCITY_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            display_edge: DEFAULT_DISPLAY_EDGE,
            prefetch_ahead: DEFAULT_PREFETCH_AHEAD,
            trash_dir_name: DEFAULT_TRASH_DIR_NAME.to_string(),
        }
    }
}

impl SwipeSettings {
    /// Loads settings from a JSON file.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// parsed is an error. Missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings: Self = serde_json::from_str(&contents)?;
        settings.validate()?;

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.commit_threshold == 0 {
            return Err(AppError::Config(
                "commit_threshold must be greater than zero".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(AppError::Config(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.display_edge == 0 {
            return Err(AppError::Config(
                "display_edge must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
