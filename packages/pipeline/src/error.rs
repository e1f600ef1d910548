//! Typed errors for browser session acquisition.
//!
//! Everything else in the pipeline propagates `anyhow::Error`; session
//! acquisition needs a typed error because one of its failures is retryable.

use thiserror::Error;

/// Errors that can occur while acquiring a browser session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Listing the fleet's sessions failed
    #[error("failed to list browser sessions: {0}")]
    Listing(#[source] anyhow::Error),

    /// The chosen session could not be connected (usually claimed or gone
    /// between listing and connect)
    #[error("failed to connect to browser session {session_id}: {source}")]
    ConnectFailed {
        session_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Launching a fresh browser instance failed
    #[error("failed to launch browser: {0}")]
    Launch(#[source] anyhow::Error),
}

impl SessionError {
    /// Whether the originating work item should be re-queued with a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::ConnectFailed { .. })
    }
}

/// Result type alias for session acquisition.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
