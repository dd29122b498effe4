//! A single user decision about one photo.

use crate::provider::AssetHandle;
use chrono::{DateTime, Utc};

/// What a swipe decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    /// Swipe left.
    Trash,
    /// Swipe right.
    Keep,
    /// Swipe up. Committed through the same bulk call as `Keep`.
    NeutralKeep,
}

impl SwipeDirection {
    /// Whether the photo survives the commit.
    pub fn is_keep(self) -> bool {
        matches!(self, SwipeDirection::Keep | SwipeDirection::NeutralKeep)
    }
}

/// An immutable, timestamped decision for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAction {
    asset: AssetHandle,
    direction: SwipeDirection,
    decided_at: DateTime<Utc>,
}

impl PhotoAction {
    pub fn new(asset: AssetHandle, direction: SwipeDirection, decided_at: DateTime<Utc>) -> Self {
        Self {
            asset,
            direction,
            decided_at,
        }
    }

    pub fn asset(&self) -> &AssetHandle {
        &self.asset
    }

    pub fn direction(&self) -> SwipeDirection {
        self.direction
    }

    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }
}
