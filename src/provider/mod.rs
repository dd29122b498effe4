//! The photo library seen as a capability: access, enumeration, pixels and
//! bulk mutations.
//!
//! The session core only talks to this trait. `LocalLibrary` backs it with a
//! directory on disk.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;

pub mod local_library;

pub use local_library::LocalLibrary;

/// Opaque, stable identifier of an asset within its library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A handle to one photo in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub id: AssetId,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Library permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationState {
    #[default]
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
    /// Readable but not fully writable.
    Limited,
}

impl AuthorizationState {
    /// Whether assets may be enumerated at all.
    pub fn allows_reading(self) -> bool {
        matches!(self, AuthorizationState::Authorized | AuthorizationState::Limited)
    }
}

/// Bounding box an image is scaled to fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }
}

/// Decoded RGB8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Photo library capability consumed by the swipe session.
///
/// Bulk mutations succeed or fail as a whole; no per-item outcome is reported.
pub trait AssetProvider: Send + Sync + 'static {
    fn request_access(&self) -> impl Future<Output = AuthorizationState> + Send;

    /// Images only, newest first.
    fn fetch_assets(&self) -> impl Future<Output = Result<Vec<AssetHandle>>> + Send;

    fn load_image(
        &self,
        handle: &AssetHandle,
        size: TargetSize,
    ) -> impl Future<Output = Result<PixelBuffer>> + Send;

    fn apply_keep(&self, handles: &[AssetHandle]) -> impl Future<Output = Result<()>> + Send;

    fn apply_trash(&self, handles: &[AssetHandle]) -> impl Future<Output = Result<()>> + Send;

    /// Warms the pixel cache for assets that are about to be shown.
    fn prefetch(&self, _handles: &[AssetHandle], _size: TargetSize) {}
}
