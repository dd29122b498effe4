//! Swipe-driven photo triage.
//!
//! A [`services::SessionService`] walks a deck of photos from an
//! [`provider::AssetProvider`], queues keep/trash decisions with undo and redo,
//! and flushes them to the library in batches.

pub mod config;
pub mod error;
pub mod file_utils;
pub mod gesture;
pub mod image_cache;
pub mod image_loader;
pub mod metadata;
pub mod provider;
pub mod services;
pub mod state;
