use super::action::SwipeDirection;

/// Display counters for a swipe session.
///
/// Only the session mutates these; `kept` includes `neutral_kept`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionProgress {
    pub total_photos: usize,
    pub processed_photos: usize,
    pub kept_photos: usize,
    pub neutral_kept_photos: usize,
    pub trashed_photos: usize,
}

impl SessionProgress {
    pub fn new(total_photos: usize) -> Self {
        Self {
            total_photos,
            ..Self::default()
        }
    }

    /// Fraction of the deck decided, in `0.0..=1.0`; zero for an empty deck.
    pub fn progress_percentage(&self) -> f64 {
        if self.total_photos == 0 {
            0.0
        } else {
            self.processed_photos as f64 / self.total_photos as f64
        }
    }

    pub(crate) fn record(&mut self, direction: SwipeDirection) {
        self.processed_photos += 1;
        match direction {
            SwipeDirection::Keep => self.kept_photos += 1,
            SwipeDirection::NeutralKeep => {
                self.kept_photos += 1;
                self.neutral_kept_photos += 1;
            }
            SwipeDirection::Trash => self.trashed_photos += 1,
        }
    }

    pub(crate) fn revert(&mut self, direction: SwipeDirection) {
        self.processed_photos = self.processed_photos.saturating_sub(1);
        match direction {
            SwipeDirection::Keep => self.kept_photos = self.kept_photos.saturating_sub(1),
            SwipeDirection::NeutralKeep => {
                self.kept_photos = self.kept_photos.saturating_sub(1);
                self.neutral_kept_photos = self.neutral_kept_photos.saturating_sub(1);
            }
            SwipeDirection::Trash => self.trashed_photos = self.trashed_photos.saturating_sub(1),
        }
    }
}
