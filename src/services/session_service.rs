//! Service for driving a swipe session from UI commands.
//!
//! Coordinates the in-memory [`SwipeSession`], the [`BatchCommitter`] and the
//! [`AssetProvider`]. Cursor and queue updates happen synchronously under the
//! session lock; provider calls are awaited afterwards with the lock released.
//! Observers receive a [`SessionSnapshot`] after every completed mutation.

use crate::config::SUBSCRIBER_BACKLOG;
use crate::error::{AppError, Result};
use crate::gesture::{DragRelease, SwipeThresholds};
use crate::provider::{AssetHandle, AssetProvider, AuthorizationState, PixelBuffer, TargetSize};
use crate::services::commit_service::{BatchCommitter, CommitReport};
use crate::state::{AppContext, CurrentAsset, CursorMove, SessionProgress, SwipeDirection, SwipeSession};
use async_std::channel::{self, Receiver, Sender};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// Read-only view of the session handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub authorization: AuthorizationState,
    pub current: CurrentAsset,
    pub index: usize,
    pub deck_len: usize,
    pub processing: bool,
    pub progress: SessionProgress,
    pub progress_percentage: f64,
    pub pending: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub error_message: Option<String>,
}

struct Shared {
    session: SwipeSession,
    error_message: Option<String>,
    subscribers: Vec<Sender<SessionSnapshot>>,
}

/// Service owning the session state for one swipe screen.
pub struct SessionService<P> {
    provider: Arc<P>,
    context: AppContext,
    committer: BatchCommitter<P>,
    shared: Arc<Mutex<Shared>>,
}

impl<P> Clone for SessionService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            context: self.context.clone(),
            committer: self.committer.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<P: AssetProvider> SessionService<P> {
    /// Creates a service with an empty deck; call [`load_photos`](Self::load_photos) to fill it.
    pub fn new(provider: Arc<P>, context: AppContext) -> Self {
        Self {
            committer: BatchCommitter::new(provider.clone()),
            provider,
            context,
            shared: Arc::new(Mutex::new(Shared {
                session: SwipeSession::default(),
                error_message: None,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn build_snapshot(&self, shared: &Shared) -> SessionSnapshot {
        let session = &shared.session;
        let progress = session.progress();
        SessionSnapshot {
            authorization: self.context.authorization(),
            current: session.current(),
            index: session.index(),
            deck_len: session.deck_len(),
            processing: session.is_processing(),
            progress,
            progress_percentage: progress.progress_percentage(),
            pending: session.pending().len(),
            can_undo: session.can_undo(),
            can_redo: session.can_redo(),
            error_message: shared.error_message.clone(),
        }
    }

    /// Sends a snapshot to every live subscriber while the lock is still held,
    /// so observers see mutations whole and in order.
    ///
    /// A subscriber whose backlog is full misses this snapshot but stays
    /// registered; closed subscribers are dropped.
    fn publish(&self, shared: &mut Shared) -> SessionSnapshot {
        let snapshot = self.build_snapshot(shared);
        shared.subscribers.retain(|tx| match tx.try_send(snapshot.clone()) {
            Ok(()) => true,
            Err(e) => {
                if e.is_full() {
                    debug!("Subscriber backlog full; snapshot skipped");
                }
                !e.is_closed()
            }
        });
        snapshot
    }

    /// Current state of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let shared = self.lock();
        self.build_snapshot(&shared)
    }

    /// Registers an observer. The current snapshot is delivered immediately.
    ///
    /// At most `SUBSCRIBER_BACKLOG` undrained snapshots are held per observer.
    pub fn subscribe(&self) -> Receiver<SessionSnapshot> {
        let (tx, rx) = channel::bounded(SUBSCRIBER_BACKLOG);
        let mut shared = self.lock();
        let _ = tx.try_send(self.build_snapshot(&shared));
        shared.subscribers.push(tx);
        rx
    }

    fn display_size(&self) -> TargetSize {
        TargetSize::square(self.context.settings().display_edge)
    }

    fn prefetch_around(&self, session: &SwipeSession) {
        let mut handles: Vec<AssetHandle> = session.current().photo().cloned().into_iter().collect();
        handles.extend_from_slice(session.upcoming(self.context.settings().prefetch_ahead));
        if !handles.is_empty() {
            self.provider.prefetch(&handles, self.display_size());
        }
    }

    fn commit_due(&self, session: &SwipeSession, moved: CursorMove) -> bool {
        let settings = self.context.settings();
        let deck_end = settings.commit_on_deck_end && moved == CursorMove::Exhausted;
        let threshold =
            settings.commit_on_threshold && session.pending().len() >= settings.commit_threshold;
        deck_end || threshold
    }

    /// (Re)initializes the session from the library.
    ///
    /// Without read access the session degrades to an empty deck rather than failing.
    /// Pending, uncommitted decisions of the previous session are dropped.
    pub async fn load_photos(&self) -> Result<SessionSnapshot> {
        let access = self.provider.request_access().await;
        self.context.update_authorization(access);

        let deck = if access.allows_reading() {
            match self.provider.fetch_assets().await {
                Ok(deck) => deck,
                Err(e) => {
                    let mut shared = self.lock();
                    shared.error_message = Some(e.to_string());
                    self.publish(&mut shared);
                    return Err(e);
                }
            }
        } else {
            warn!("Library access is {:?}; presenting an empty deck", access);
            Vec::new()
        };

        let mut shared = self.lock();
        let dropped = shared.session.pending().len();
        if dropped > 0 {
            warn!("Reload discards {} uncommitted decisions", dropped);
        }
        info!("Loaded session with {} photos", deck.len());
        shared.session = SwipeSession::new(deck);
        shared.error_message = None;
        self.prefetch_around(&shared.session);
        Ok(self.publish(&mut shared))
    }

    /// Records a decision for the current photo; commits if a trigger fires.
    ///
    /// A no-op when there is no current photo.
    pub async fn swipe(&self, direction: SwipeDirection) -> SessionSnapshot {
        let (snapshot, due) = {
            let mut shared = self.lock();
            match shared.session.record_decision(direction, Utc::now()) {
                None => return self.build_snapshot(&shared),
                Some(moved) => {
                    let due = self.commit_due(&shared.session, moved);
                    self.prefetch_around(&shared.session);
                    (self.publish(&mut shared), due)
                }
            }
        };

        if due {
            self.commit().await;
            return self.snapshot();
        }
        snapshot
    }

    /// Classifies a released drag and swipes if it was decisive.
    pub async fn release_drag(&self, release: DragRelease) -> SessionSnapshot {
        let thresholds = SwipeThresholds::from(self.context.settings());
        match thresholds.classify(release) {
            Some(direction) => self.swipe(direction).await,
            None => {
                debug!("Drag {:?} below thresholds; snapping back", release);
                self.snapshot()
            }
        }
    }

    /// Takes back the latest uncommitted decision. Returns false when there was none.
    pub fn undo(&self) -> bool {
        let mut shared = self.lock();
        if !shared.session.undo() {
            return false;
        }
        self.publish(&mut shared);
        true
    }

    /// Re-applies the latest undone decision; commits if a trigger fires.
    pub async fn redo(&self) -> SessionSnapshot {
        let (snapshot, due) = {
            let mut shared = self.lock();
            match shared.session.redo() {
                None => return self.build_snapshot(&shared),
                Some(moved) => {
                    let due = self.commit_due(&shared.session, moved);
                    self.prefetch_around(&shared.session);
                    (self.publish(&mut shared), due)
                }
            }
        };

        if due {
            self.commit().await;
            return self.snapshot();
        }
        snapshot
    }

    /// Flushes every pending decision to the library.
    ///
    /// Returns `None` when nothing was pending or a commit is already in flight.
    /// Decisions queued while a pass was in flight are flushed by a follow-up pass
    /// if a trigger holds for them once it finishes. The batch is not re-queued
    /// on failure; the failure is surfaced through `error_message` instead.
    pub async fn commit(&self) -> Option<CommitReport> {
        let mut batch = {
            let mut shared = self.lock();
            let batch = shared.session.begin_commit()?;
            self.publish(&mut shared);
            batch
        };

        let mut summary = CommitReport::default();
        loop {
            debug!("Committing {} decisions", batch.len());
            summary.absorb(self.committer.commit(batch).await);

            let follow_up = {
                let mut shared = self.lock();
                shared.session.finish_commit();
                shared.error_message = summary.error_message();
                let follow_up = if self.queued_commit_due(&shared.session) {
                    shared.session.begin_commit()
                } else {
                    None
                };
                self.publish(&mut shared);
                follow_up
            };

            match follow_up {
                Some(next) => {
                    debug!("{} decisions arrived during the commit", next.len());
                    batch = next;
                }
                None => return Some(summary),
            }
        }
    }

    /// Whether decisions left in the queue after a commit pass need another pass.
    fn queued_commit_due(&self, session: &SwipeSession) -> bool {
        if session.pending().is_empty() {
            return false;
        }
        let settings = self.context.settings();
        (settings.commit_on_deck_end && session.is_exhausted())
            || (settings.commit_on_threshold
                && session.pending().len() >= settings.commit_threshold)
    }

    /// Pixels of the current photo at display size.
    pub async fn current_image(&self) -> Result<PixelBuffer> {
        let current = self.lock().session.current();
        match current {
            CurrentAsset::Photo(handle) => {
                self.provider.load_image(&handle, self.display_size()).await
            }
            CurrentAsset::Exhausted => Err(AppError::ImageLoad("No current photo".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwipeSettings;
    use crate::provider::AssetId;
    use crate::provider::testing::{Call, FakeProvider};
    use async_std::task::block_on;

    fn service(provider: FakeProvider) -> (SessionService<FakeProvider>, Arc<FakeProvider>) {
        service_with(provider, SwipeSettings::default())
    }

    fn service_with(
        provider: FakeProvider,
        settings: SwipeSettings,
    ) -> (SessionService<FakeProvider>, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let service = SessionService::new(provider.clone(), AppContext::new(settings));
        block_on(service.load_photos()).unwrap();
        (service, provider)
    }

    fn ids(list: &[&str]) -> Vec<AssetId> {
        list.iter().map(|id| AssetId::new(*id)).collect()
    }

    fn current_id(snapshot: &SessionSnapshot) -> Option<&str> {
        snapshot.current.photo().map(|h| h.id.as_str())
    }

    #[test]
    fn load_positions_on_first_photo() {
        let (service, provider) = service(FakeProvider::new(&["a", "b", "c", "d"]));
        let snapshot = service.snapshot();

        assert_eq!(snapshot.authorization, AuthorizationState::Authorized);
        assert_eq!(current_id(&snapshot), Some("a"));
        assert_eq!(snapshot.progress.total_photos, 4);
        assert_eq!(*provider.prefetched.lock().unwrap(), ids(&["a", "b", "c"]));
    }

    #[test]
    fn denied_access_degrades_to_empty_deck() {
        let mut fake = FakeProvider::new(&["a"]);
        fake.access = AuthorizationState::Denied;
        let (service, _) = service(fake);
        let snapshot = service.snapshot();

        assert_eq!(snapshot.authorization, AuthorizationState::Denied);
        assert_eq!(snapshot.current, CurrentAsset::Exhausted);
        assert_eq!(snapshot.deck_len, 0);
        assert!(snapshot.error_message.is_none());
    }

    #[test]
    fn swiping_whole_deck_commits_once_with_partition() {
        let (service, provider) = service(FakeProvider::new(&["a", "b", "c", "d"]));

        block_on(service.swipe(SwipeDirection::Keep));
        block_on(service.swipe(SwipeDirection::Trash));
        block_on(service.swipe(SwipeDirection::NeutralKeep));
        assert!(provider.calls().is_empty());
        let snapshot = block_on(service.swipe(SwipeDirection::Trash));

        assert_eq!(snapshot.index, 4);
        assert_eq!(snapshot.pending, 0);
        assert!(!snapshot.processing);
        assert_eq!(
            provider.calls(),
            vec![Call::Keep(ids(&["a", "c"])), Call::Trash(ids(&["b", "d"]))]
        );
    }

    #[test]
    fn threshold_commits_before_deck_end() {
        let names: Vec<String> = (0..12).map(|i| format!("p{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (service, provider) = service(FakeProvider::new(&refs));

        for i in 0..10 {
            let direction = if i % 3 == 0 {
                SwipeDirection::Trash
            } else {
                SwipeDirection::Keep
            };
            block_on(service.swipe(direction));
        }

        let snapshot = service.snapshot();
        assert_eq!(snapshot.pending, 0);
        assert_eq!(current_id(&snapshot), Some("p10"));
        assert!(!snapshot.can_undo);
        assert_eq!(
            provider.calls(),
            vec![
                Call::Keep(ids(&["p01", "p02", "p04", "p05", "p07", "p08"])),
                Call::Trash(ids(&["p00", "p03", "p06", "p09"])),
            ]
        );
    }

    #[test]
    fn disabled_triggers_leave_queue_for_manual_commit() {
        let settings = SwipeSettings {
            commit_on_deck_end: false,
            commit_on_threshold: false,
            ..SwipeSettings::default()
        };
        let (service, provider) = service_with(FakeProvider::new(&["a"]), settings);

        block_on(service.swipe(SwipeDirection::Keep));
        assert_eq!(service.snapshot().pending, 1);
        assert!(provider.calls().is_empty());

        let report = block_on(service.commit()).unwrap();
        assert!(report.is_success());
        assert_eq!(service.snapshot().pending, 0);
        assert!(block_on(service.commit()).is_none());
    }

    #[test]
    fn failed_commit_still_empties_queue_and_reports() {
        let mut fake = FakeProvider::new(&["a", "b"]);
        fake.fail_trash = true;
        let (service, _) = service(fake);

        block_on(service.swipe(SwipeDirection::Keep));
        let snapshot = block_on(service.swipe(SwipeDirection::Trash));

        assert_eq!(snapshot.pending, 0);
        assert!(!snapshot.processing);
        assert!(snapshot.error_message.unwrap().contains("trash rejected"));
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let (service, _) = service(FakeProvider::new(&["A", "B", "C"]));
        block_on(service.swipe(SwipeDirection::Keep));
        block_on(service.swipe(SwipeDirection::Trash));

        assert!(service.undo());
        let after_undo = service.snapshot();
        assert_eq!(current_id(&after_undo), Some("B"));
        assert_eq!(after_undo.pending, 1);
        assert_eq!(after_undo.progress.processed_photos, 1);
        assert!(after_undo.can_redo);

        let after_redo = block_on(service.redo());
        assert_eq!(current_id(&after_redo), Some("C"));
        assert_eq!(after_redo.pending, 2);
        assert_eq!(after_redo.progress.trashed_photos, 1);
    }

    #[test]
    fn exhausted_deck_ignores_swipes_and_undo() {
        let (service, provider) = service(FakeProvider::new(&["a"]));
        block_on(service.swipe(SwipeDirection::Trash));
        let before = service.snapshot();

        let after = block_on(service.swipe(SwipeDirection::Keep));

        assert_eq!(after, before);
        assert!(!service.undo());
        assert_eq!(provider.calls().len(), 1);
    }

    #[test]
    fn short_drag_changes_nothing() {
        let (service, _) = service(FakeProvider::new(&["a", "b"]));
        let before = service.snapshot();

        let after = block_on(service.release_drag(DragRelease {
            translation: 30.0,
            predicted_translation: 60.0,
        }));
        assert_eq!(after, before);

        let swiped = block_on(service.release_drag(DragRelease {
            translation: -180.0,
            predicted_translation: -400.0,
        }));
        assert_eq!(swiped.progress.trashed_photos, 1);
    }

    #[test]
    fn subscribers_see_each_completed_mutation() {
        let (service, _) = service(FakeProvider::new(&["a", "b", "c"]));
        let rx = service.subscribe();

        block_on(service.swipe(SwipeDirection::Keep));
        service.undo();

        let initial = rx.try_recv().unwrap();
        let swiped = rx.try_recv().unwrap();
        let undone = rx.try_recv().unwrap();
        assert_eq!(initial.progress.processed_photos, 0);
        assert_eq!(swiped.progress.processed_photos, 1);
        assert_eq!(current_id(&swiped), Some("b"));
        assert_eq!(undone.progress.processed_photos, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn commit_publishes_processing_then_idle() {
        let (service, _) = service(FakeProvider::new(&["a"]));
        let rx = service.subscribe();
        rx.try_recv().unwrap();

        block_on(service.swipe(SwipeDirection::Keep));

        let states: Vec<(usize, bool)> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|s| (s.pending, s.processing))
            .collect();
        assert_eq!(states, vec![(1, false), (0, true), (0, false)]);
    }

    #[test]
    fn swipes_during_a_commit_are_flushed_when_it_finishes() {
        let (started_tx, started_rx) = channel::unbounded();
        let (gate_tx, gate_rx) = channel::unbounded();
        let mut fake = FakeProvider::new(&["a", "b", "c"]);
        fake.keep_started = Some(started_tx);
        fake.keep_gate = Some(gate_rx);
        let settings = SwipeSettings {
            commit_threshold: 2,
            ..SwipeSettings::default()
        };
        let (service, provider) = service_with(fake, settings);

        block_on(async {
            service.swipe(SwipeDirection::Keep).await;
            let committing = service.clone();
            let first_commit =
                async_std::task::spawn(async move { committing.swipe(SwipeDirection::Keep).await });
            started_rx.recv().await.unwrap();

            let during = service.swipe(SwipeDirection::Trash).await;
            assert!(during.processing);
            assert_eq!(during.pending, 1);
            assert_eq!(during.current, CurrentAsset::Exhausted);

            gate_tx.send(()).await.unwrap();
            first_commit.await;
        });

        let snapshot = service.snapshot();
        assert_eq!(snapshot.pending, 0);
        assert!(!snapshot.processing);
        assert_eq!(
            provider.calls(),
            vec![Call::Keep(ids(&["a", "b"])), Call::Trash(ids(&["c"]))]
        );
    }

    #[test]
    fn manual_commit_leaves_later_swipes_queued_below_threshold() {
        let (started_tx, started_rx) = channel::unbounded();
        let (gate_tx, gate_rx) = channel::unbounded();
        let mut fake = FakeProvider::new(&["a", "b", "c"]);
        fake.keep_started = Some(started_tx);
        fake.keep_gate = Some(gate_rx);
        let (service, provider) = service(fake);

        block_on(async {
            service.swipe(SwipeDirection::Keep).await;
            let committing = service.clone();
            let manual = async_std::task::spawn(async move { committing.commit().await });
            started_rx.recv().await.unwrap();

            service.swipe(SwipeDirection::Trash).await;
            gate_tx.send(()).await.unwrap();
            let report = manual.await.unwrap();
            assert_eq!((report.kept, report.trashed), (1, 0));
        });

        assert_eq!(service.snapshot().pending, 1);
        assert_eq!(provider.calls(), vec![Call::Keep(ids(&["a"]))]);
    }

    #[test]
    fn undrained_subscriber_backlog_stays_bounded() {
        let names: Vec<String> = (0..40).map(|i| format!("p{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let settings = SwipeSettings {
            commit_on_threshold: false,
            ..SwipeSettings::default()
        };
        let (service, _) = service_with(FakeProvider::new(&refs), settings);
        let rx = service.subscribe();

        for _ in 0..30 {
            block_on(service.swipe(SwipeDirection::Keep));
        }
        assert_eq!(rx.len(), SUBSCRIBER_BACKLOG);

        while rx.try_recv().is_ok() {}
        block_on(service.swipe(SwipeDirection::Trash));
        let latest = rx.try_recv().unwrap();
        assert_eq!(latest.progress.processed_photos, 31);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let (service, _) = service(FakeProvider::new(&["a", "b"]));
        drop(service.subscribe());
        let kept = service.subscribe();

        block_on(service.swipe(SwipeDirection::Keep));

        assert_eq!(service.lock().subscribers.len(), 1);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn reload_starts_fresh_session() {
        let (service, _) = service(FakeProvider::new(&["a", "b", "c"]));
        block_on(service.swipe(SwipeDirection::Keep));

        let snapshot = block_on(service.load_photos()).unwrap();

        assert_eq!(snapshot.index, 0);
        assert_eq!(snapshot.pending, 0);
        assert_eq!(snapshot.progress.processed_photos, 0);
    }

    #[test]
    fn current_image_uses_display_size() {
        let settings = SwipeSettings {
            display_edge: 8,
            ..SwipeSettings::default()
        };
        let (service, _) = service_with(FakeProvider::new(&["a"]), settings);

        let pixels = block_on(service.current_image()).unwrap();
        assert_eq!((pixels.width, pixels.height), (8, 8));

        block_on(service.swipe(SwipeDirection::Keep));
        assert!(block_on(service.current_image()).is_err());
    }
}
