//! Service for flushing queued decisions to the photo library.
//!
//! Partitions a batch into keeps and trashes and issues one bulk call for each.
//! The two calls are independent: a failure in one does not undo the other.

use crate::provider::{AssetHandle, AssetProvider};
use crate::state::PhotoAction;
use log::{debug, error, info};
use std::sync::Arc;

/// Outcome of one batch commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub kept: usize,
    pub trashed: usize,
    pub keep_error: Option<String>,
    pub trash_error: Option<String>,
}

impl CommitReport {
    pub fn is_success(&self) -> bool {
        self.keep_error.is_none() && self.trash_error.is_none()
    }

    /// Folds the outcome of a follow-up pass into this one.
    pub fn absorb(&mut self, other: CommitReport) {
        self.kept += other.kept;
        self.trashed += other.trashed;
        self.keep_error = join_errors(self.keep_error.take(), other.keep_error);
        self.trash_error = join_errors(self.trash_error.take(), other.trash_error);
    }

    /// Human-readable description of whatever failed.
    pub fn error_message(&self) -> Option<String> {
        match (&self.keep_error, &self.trash_error) {
            (None, None) => None,
            (Some(keep), None) => Some(format!("Failed to keep {} photos: {}", self.kept, keep)),
            (None, Some(trash)) => Some(format!(
                "Failed to trash {} photos: {}",
                self.trashed, trash
            )),
            (Some(keep), Some(trash)) => Some(format!(
                "Failed to keep {} photos: {}; failed to trash {} photos: {}",
                self.kept, keep, self.trashed, trash
            )),
        }
    }
}

fn join_errors(first: Option<String>, second: Option<String>) -> Option<String> {
    match (first, second) {
        (Some(a), Some(b)) => Some(format!("{}; {}", a, b)),
        (a, b) => a.or(b),
    }
}

/// Applies batches of decisions through an [`AssetProvider`].
pub struct BatchCommitter<P> {
    provider: Arc<P>,
}

impl<P> Clone for BatchCommitter<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}

impl<P: AssetProvider> BatchCommitter<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Commits a batch. Failed actions are reported, not retried.
    pub async fn commit(&self, batch: Vec<PhotoAction>) -> CommitReport {
        if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
            debug!(
                "Batch of {} decided between {} and {}",
                batch.len(),
                first.decided_at().format("%H:%M:%S"),
                last.decided_at().format("%H:%M:%S")
            );
        }

        let (keep, trash): (Vec<PhotoAction>, Vec<PhotoAction>) =
            batch.into_iter().partition(|a| a.direction().is_keep());
        let keep: Vec<AssetHandle> = keep.into_iter().map(|a| a.asset().clone()).collect();
        let trash: Vec<AssetHandle> = trash.into_iter().map(|a| a.asset().clone()).collect();

        let mut report = CommitReport {
            kept: keep.len(),
            trashed: trash.len(),
            ..CommitReport::default()
        };

        if !keep.is_empty() {
            if let Err(e) = self.provider.apply_keep(&keep).await {
                error!("Keep batch of {} failed: {}", keep.len(), e);
                report.keep_error = Some(e.to_string());
            }
        }

        if !trash.is_empty() {
            if let Err(e) = self.provider.apply_trash(&trash).await {
                error!("Trash batch of {} failed: {}", trash.len(), e);
                report.trash_error = Some(e.to_string());
            }
        }

        info!(
            "Committed batch: {} kept, {} trashed{}",
            report.kept,
            report.trashed,
            if report.is_success() { "" } else { " (with failures)" }
        );
        report
    }
}
