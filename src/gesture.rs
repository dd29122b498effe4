//! Classifies a released drag into a swipe decision.
//!
//! Only the horizontal axis decides: positive is keep, negative is trash.
//! Neutral keep is never produced here.

use crate::config::SwipeSettings;
use crate::state::SwipeDirection;

/// Horizontal measurements of a drag at the moment it was released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    /// Horizontal displacement from the card's resting position.
    pub translation: f32,
    /// Displacement the drag would reach if its release velocity were carried through.
    pub predicted_translation: f32,
}

/// Distance and velocity thresholds for turning a drag into a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeThresholds {
    pub distance: f32,
    pub velocity: f32,
}

impl From<&SwipeSettings> for SwipeThresholds {
    fn from(settings: &SwipeSettings) -> Self {
        Self {
            distance: settings.swipe_distance_threshold,
            velocity: settings.swipe_velocity_threshold,
        }
    }
}

impl SwipeThresholds {
    /// Returns the decision for a release, or `None` when the card should snap back.
    pub fn classify(&self, release: DragRelease) -> Option<SwipeDirection> {
        let decisive = if release.translation.abs() > self.distance {
            release.translation
        } else if release.predicted_translation.abs() > self.velocity {
            release.predicted_translation
        } else {
            return None;
        };

        if decisive > 0.0 {
            Some(SwipeDirection::Keep)
        } else {
            Some(SwipeDirection::Trash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> SwipeThresholds {
        SwipeThresholds::from(&SwipeSettings::default())
    }

    fn release(translation: f32, predicted_translation: f32) -> DragRelease {
        DragRelease {
            translation,
            predicted_translation,
        }
    }

    #[test]
    fn long_drags_decide_by_sign() {
        assert_eq!(thresholds().classify(release(150.0, 150.0)), Some(SwipeDirection::Keep));
        assert_eq!(thresholds().classify(release(-150.0, -150.0)), Some(SwipeDirection::Trash));
    }

    #[test]
    fn short_fast_flicks_decide_by_projection() {
        assert_eq!(thresholds().classify(release(20.0, 400.0)), Some(SwipeDirection::Keep));
        assert_eq!(thresholds().classify(release(-20.0, -400.0)), Some(SwipeDirection::Trash));
    }

    #[test]
    fn short_slow_drags_snap_back() {
        assert_eq!(thresholds().classify(release(50.0, 120.0)), None);
        assert_eq!(thresholds().classify(release(100.0, 300.0)), None);
    }
}
