//! Swipe session: the deck, its cursor, pending decisions and undo history.

use super::action::{PhotoAction, SwipeDirection};
use super::progress::SessionProgress;
use crate::provider::AssetHandle;
use chrono::{DateTime, Utc};
use log::{debug, warn};

/// The photo under the cursor, or the end of the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentAsset {
    Photo(AssetHandle),
    /// No photo left to decide on (or none loaded).
    Exhausted,
}

impl CurrentAsset {
    pub fn photo(&self) -> Option<&AssetHandle> {
        match self {
            CurrentAsset::Photo(handle) => Some(handle),
            CurrentAsset::Exhausted => None,
        }
    }
}

/// Where the cursor ended up after moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Advanced,
    /// The cursor passed the last photo.
    Exhausted,
}

/// In-memory state of one swipe session.
///
/// Invariants: `index <= deck.len()`; an action is either in the queue
/// (pending commit) or on the undo stack (pending redo), never both.
#[derive(Debug, Default)]
pub struct SwipeSession {
    deck: Vec<AssetHandle>,
    index: usize,
    queue: Vec<PhotoAction>,
    undo_stack: Vec<PhotoAction>,
    processing: bool,
    progress: SessionProgress,
}

impl SwipeSession {
    /// Creates a session positioned on the first photo of `deck`.
    pub fn new(deck: Vec<AssetHandle>) -> Self {
        let progress = SessionProgress::new(deck.len());
        Self {
            deck,
            progress,
            ..Self::default()
        }
    }

    pub fn current(&self) -> CurrentAsset {
        match self.deck.get(self.index) {
            Some(handle) => CurrentAsset::Photo(handle.clone()),
            None => CurrentAsset::Exhausted,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.deck.len()
    }

    pub fn progress(&self) -> SessionProgress {
        self.progress
    }

    pub fn pending(&self) -> &[PhotoAction] {
        &self.queue
    }

    pub fn undo_stack(&self) -> &[PhotoAction] {
        &self.undo_stack
    }

    pub fn can_undo(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Photos after the current one, at most `count`.
    pub fn upcoming(&self, count: usize) -> &[AssetHandle] {
        let start = (self.index + 1).min(self.deck.len());
        let end = (start + count).min(self.deck.len());
        &self.deck[start..end]
    }

    /// Queues a decision for the current photo and moves to the next one.
    ///
    /// Returns `None` without touching any state when there is no current photo.
    /// A new decision discards the redo history.
    pub fn record_decision(
        &mut self,
        direction: SwipeDirection,
        decided_at: DateTime<Utc>,
    ) -> Option<CursorMove> {
        let CurrentAsset::Photo(asset) = self.current() else {
            debug!("Ignoring {:?}: no current photo", direction);
            return None;
        };

        if self.queue.iter().any(|a| a.asset().id == asset.id) {
            warn!("{} already has a pending decision", asset.id);
        }

        debug!("Decision {:?} for {}", direction, asset.id);
        self.queue.push(PhotoAction::new(asset, direction, decided_at));
        self.undo_stack.clear();
        self.progress.record(direction);
        Some(self.advance_cursor())
    }

    /// Moves the cursor forward by one, stopping at the end of the deck.
    pub fn advance_cursor(&mut self) -> CursorMove {
        if self.index < self.deck.len() {
            self.index += 1;
        }
        if self.is_exhausted() {
            CursorMove::Exhausted
        } else {
            CursorMove::Advanced
        }
    }

    /// Takes back the most recent pending decision.
    ///
    /// Returns false (and changes nothing) when nothing is pending.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.queue.pop() else {
            debug!("Nothing to undo");
            return false;
        };

        self.progress.revert(action.direction());
        if self.index > 0 {
            self.index -= 1;
        }
        debug!("Undid {:?} for {}", action.direction(), action.asset().id);
        self.undo_stack.push(action);
        true
    }

    /// Re-applies the most recently undone decision.
    ///
    /// Returns `None` (and changes nothing) when there is nothing to redo.
    pub fn redo(&mut self) -> Option<CursorMove> {
        let action = self.undo_stack.pop()?;

        self.progress.record(action.direction());
        debug!("Redid {:?} for {}", action.direction(), action.asset().id);
        self.queue.push(action);
        Some(self.advance_cursor())
    }

    /// Marks a commit as in flight and hands over every pending decision.
    ///
    /// Returns `None` if a commit is already running or nothing is pending.
    pub fn begin_commit(&mut self) -> Option<Vec<PhotoAction>> {
        if self.processing {
            warn!("Commit already in progress; ignoring trigger");
            return None;
        }
        if self.queue.is_empty() {
            return None;
        }

        self.processing = true;
        Some(std::mem::take(&mut self.queue))
    }

    /// Clears the in-flight flag set by [`begin_commit`](Self::begin_commit).
    pub fn finish_commit(&mut self) {
        self.processing = false;
    }
}
