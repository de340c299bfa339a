//! Tracks the current session from the auth provider's change stream

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::auth::{AuthChangeEvent, Session};
use crate::backend::Backend;

/// Holds the session seen by the application.
///
/// The tracker is the only writer of its session: it is set once from
/// [`Backend::current_session`] and afterwards replaced by every change event.
pub struct SessionTracker {
    session: Option<Session>,
    changes: broadcast::Receiver<AuthChangeEvent>,
}

impl SessionTracker {
    /// Subscribe to changes, then fetch the current session once.
    ///
    /// A failed fetch leaves the tracker signed out.
    pub async fn start(backend: &dyn Backend) -> Self {
        let changes = backend.on_session_change();
        let session = match backend.current_session().await {
            Ok(session) => session,
            Err(err) => {
                log::warn!("could not fetch the current session: {}", err);
                None
            }
        };
        Self { session, changes }
    }

    fn apply(&mut self, event: AuthChangeEvent) {
        log::debug!("session change: {:?}", event.kind);
        self.session = event.session;
    }

    /// Apply every pending change without waiting. Returns whether any arrived.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.changes.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    changed = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    log::debug!("skipped {} stale session events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed,
            }
        }
    }

    /// Wait for the next change and apply it.
    ///
    /// Never resolves once the backend has dropped its sender.
    pub async fn changed(&mut self) {
        loop {
            match self.changes.recv().await {
                Ok(event) => {
                    self.apply(event);
                    return;
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("skipped {} stale session events", skipped);
                }
                Err(RecvError::Closed) => std::future::pending::<()>().await,
            }
        }
    }

    /// The current session
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether mutating controls should be offered
    pub fn is_authorized(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |session| session.user_id().is_some())
    }
}
