//! State management for the photo triage application.

use crate::config::SwipeSettings;
use crate::provider::AuthorizationState;
use std::sync::{Arc, RwLock};

pub mod action;
pub mod progress;
pub mod session;

pub use action::{PhotoAction, SwipeDirection};
pub use progress::SessionProgress;
pub use session::{CurrentAsset, CursorMove, SwipeSession};

/// Application-wide context, created once at launch and passed explicitly
/// to the session service and the presentation layer.
#[derive(Clone)]
pub struct AppContext {
    settings: Arc<SwipeSettings>,
    /// Last known library authorization. Written by the session service,
    /// read by any presentation tree.
    authorization: Arc<RwLock<AuthorizationState>>,
}

impl AppContext {
    pub fn new(settings: SwipeSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            authorization: Arc::new(RwLock::new(AuthorizationState::NotDetermined)),
        }
    }

    pub fn settings(&self) -> &SwipeSettings {
        &self.settings
    }

    pub fn authorization(&self) -> AuthorizationState {
        self.authorization
            .read()
            .map(|state| *state)
            .unwrap_or_default()
    }

    pub fn update_authorization(&self, state: AuthorizationState) {
        if let Ok(mut guard) = self.authorization.write() {
            *guard = state;
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(SwipeSettings::default())
    }
}
