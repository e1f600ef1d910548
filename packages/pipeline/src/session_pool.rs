//! Best-effort acquisition of remote browser sessions.
//!
//! # Protocol
//!
//! ```text
//! list_sessions()
//!     │
//!     ├─► drop sessions someone is connected to
//!     ├─► pick one of the rest at random ──► connect(id)
//!     │                                          ├─ ok  ──► Lease (Pooled)
//!     │                                          └─ err ──► SessionError::ConnectFailed (retryable)
//!     └─► nothing left ──► launch(keep_alive) ──► Lease (Launched)
//! ```
//!
//! Claiming is advisory. Two workers may pick the same idle session; the loser's
//! connect fails and its work item is re-queued instead of holding a lock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};
use crate::traits::browser::{Browser, BrowserFleet, Page};
use crate::types::{LaunchOptions, Session};

/// Redelivery delay after losing a session connect race.
pub const SESSION_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Where a leased browser came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseOrigin {
    /// Connected to an idle session from the listing
    Pooled,
    /// Freshly launched because no idle session was available
    Launched,
}

/// A browser held for the duration of one stage invocation.
///
/// Must be handed back with [`Lease::release`] so the session returns to the
/// pool for other invocations.
pub struct Lease {
    browser: Box<dyn Browser>,
    origin: LeaseOrigin,
}

impl Lease {
    pub fn origin(&self) -> LeaseOrigin {
        self.origin
    }

    pub fn session_id(&self) -> &str {
        self.browser.session_id()
    }

    pub async fn new_page(&self) -> Result<Box<dyn Page>> {
        self.browser.new_page().await
    }

    /// Disconnect without terminating the instance.
    pub async fn release(self) -> Result<()> {
        debug!(session_id = %self.browser.session_id(), origin = ?self.origin, "releasing browser session");
        self.browser.disconnect().await
    }
}

pub struct SessionPool {
    fleet: Arc<dyn BrowserFleet>,
    keep_alive: Duration,
}

impl SessionPool {
    pub fn new(fleet: Arc<dyn BrowserFleet>, keep_alive: Duration) -> Self {
        Self { fleet, keep_alive }
    }

    pub async fn acquire(&self) -> SessionResult<Lease> {
        let sessions = self
            .fleet
            .list_sessions()
            .await
            .map_err(SessionError::Listing)?;
        debug!(sessions = ?sessions, "browser sessions listed");

        if let Some(session_id) = pick_idle(&sessions) {
            let browser = self
                .fleet
                .connect(&session_id)
                .await
                .map_err(|source| SessionError::ConnectFailed {
                    session_id: session_id.clone(),
                    source,
                })?;

            info!(session_id = %session_id, "connected to pooled browser session");
            return Ok(Lease {
                browser,
                origin: LeaseOrigin::Pooled,
            });
        }

        let browser = self
            .fleet
            .launch(LaunchOptions::pooled(self.keep_alive))
            .await
            .map_err(SessionError::Launch)?;

        info!(
            session_id = %browser.session_id(),
            keep_alive_ms = self.keep_alive.as_millis() as u64,
            "launched new browser session"
        );
        Ok(Lease {
            browser,
            origin: LeaseOrigin::Launched,
        })
    }
}

/// Uniformly random choice among sessions nobody is connected to.
fn pick_idle(sessions: &[Session]) -> Option<String> {
    let idle: Vec<&Session> = sessions.iter().filter(|s| !s.busy).collect();
    if idle.is_empty() {
        return None;
    }
    Some(idle[fastrand::usize(..idle.len())].id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FleetCall, MockFleet};

    fn pool(fleet: &Arc<MockFleet>) -> SessionPool {
        SessionPool::new(fleet.clone(), Duration::from_secs(600))
    }

    #[test]
    fn test_pick_idle_skips_busy_sessions() {
        let sessions = vec![Session::busy("a"), Session::idle("b"), Session::busy("c")];
        for _ in 0..20 {
            assert_eq!(pick_idle(&sessions).as_deref(), Some("b"));
        }
    }

    #[test]
    fn test_pick_idle_reaches_every_candidate() {
        let sessions = vec![Session::idle("a"), Session::idle("b")];
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_idle(&sessions).unwrap());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_pick_idle_empty() {
        assert!(pick_idle(&[]).is_none());
        assert!(pick_idle(&[Session::busy("a")]).is_none());
    }

    #[tokio::test]
    async fn test_launches_when_no_idle_session() {
        let fleet = Arc::new(MockFleet::new().with_sessions(vec![Session::busy("taken")]));

        let lease = pool(&fleet).acquire().await.unwrap();

        assert_eq!(lease.origin(), LeaseOrigin::Launched);
        let calls = fleet.calls();
        assert!(!calls.iter().any(|c| matches!(c, FleetCall::Connect(_))));
        assert!(calls.contains(&FleetCall::Launch(LaunchOptions::pooled(
            Duration::from_secs(600)
        ))));
    }

    #[tokio::test]
    async fn test_connects_to_idle_session() {
        let fleet = Arc::new(MockFleet::new().with_sessions(vec![Session::idle("s-1")]));

        let lease = pool(&fleet).acquire().await.unwrap();

        assert_eq!(lease.origin(), LeaseOrigin::Pooled);
        assert_eq!(lease.session_id(), "s-1");
        assert!(!fleet.calls().iter().any(|c| matches!(c, FleetCall::Launch(_))));
    }

    #[tokio::test]
    async fn test_connect_failure_is_retryable() {
        let fleet = Arc::new(
            MockFleet::new()
                .with_sessions(vec![Session::idle("s-1")])
                .failing_connect(),
        );

        let err = pool(&fleet).acquire().await.err().unwrap();

        assert!(err.is_retryable());
        assert!(!fleet.calls().iter().any(|c| matches!(c, FleetCall::Launch(_))));
    }

    #[tokio::test]
    async fn test_listing_failure_is_not_retryable() {
        let fleet = Arc::new(MockFleet::new().failing_listing());

        let err = pool(&fleet).acquire().await.err().unwrap();

        assert!(matches!(err, SessionError::Listing(_)));
        assert!(!err.is_retryable());
        assert_eq!(fleet.calls(), vec![FleetCall::ListSessions]);
    }

    #[tokio::test]
    async fn test_launch_failure_is_not_retryable() {
        let fleet = Arc::new(MockFleet::new().failing_launch());

        let err = pool(&fleet).acquire().await.err().unwrap();

        assert!(matches!(err, SessionError::Launch(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_release_disconnects_instead_of_terminating() {
        let fleet = Arc::new(MockFleet::new().with_sessions(vec![Session::idle("s-1")]));

        let lease = pool(&fleet).acquire().await.unwrap();
        lease.release().await.unwrap();

        let calls = fleet.calls();
        assert!(calls.contains(&FleetCall::Disconnect("s-1".into())));
        assert!(!calls.contains(&FleetCall::Terminate("s-1".into())));
    }
}
