//! Image cache for fast swiping.
//!
//! Caches decoded RGB8 pixel buffers per asset and target size using an LRU
//! policy, so the next card can be shown without decoding again.

use crate::provider::{AssetId, PixelBuffer, TargetSize};
use lru::LruCache;
use std::num::NonZeroUsize;

type CacheKey = (AssetId, TargetSize);

/// LRU cache for storing decoded images.
pub struct ImageCache {
    cache: LruCache<CacheKey, PixelBuffer>,
}

impl ImageCache {
    /// Creates a new image cache with the specified capacity (clamped to at least one entry).
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Retrieves an image from the cache if it exists.
    pub fn get(&mut self, id: &AssetId, size: TargetSize) -> Option<PixelBuffer> {
        let result = self.cache.get(&(id.clone(), size)).cloned();
        if result.is_some() {
            log::debug!("Cache HIT: {} @ {}x{}", id, size.width, size.height);
        } else {
            log::debug!("Cache MISS: {} @ {}x{}", id, size.width, size.height);
        }
        result
    }

    /// Stores an image in the cache.
    pub fn put(&mut self, id: AssetId, size: TargetSize, pixels: PixelBuffer) {
        log::debug!(
            "Cache PUT: {} ({}x{})",
            id,
            pixels.width,
            pixels.height
        );
        self.cache.put((id, size), pixels);
    }

    /// Checks if an image is in the cache without touching its LRU position.
    pub fn contains(&self, id: &AssetId, size: TargetSize) -> bool {
        self.cache.contains(&(id.clone(), size))
    }

    /// Drops every cached size of an asset.
    pub fn evict(&mut self, id: &AssetId) {
        let stale: Vec<CacheKey> = self
            .cache
            .iter()
            .filter(|((cached_id, _), _)| cached_id == id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            self.cache.pop(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}
