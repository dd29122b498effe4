//! Service layer for business logic.
//!
//! Separates session logic from the presentation layer for better testability.

pub mod commit_service;
pub mod session_service;

pub use commit_service::{BatchCommitter, CommitReport};
pub use session_service::{SessionService, SessionSnapshot};
