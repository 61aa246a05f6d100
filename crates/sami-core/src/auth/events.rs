//! Session lifecycle notifications.
//!
//! The API client and session store never navigate anywhere themselves.
//! They emit a [`SessionEvent`] and the hosting application decides what
//! "go to the login view" means for it.

use tokio::sync::broadcast;
use tracing::debug;

use crate::models::User;

/// Buffer for undelivered session events per subscriber.
/// Events are rare (login, logout, expiry), 16 is plenty.
const EVENT_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend rejected the token (401). The token has been deleted.
    Expired,
    LoggedIn(User),
    LoggedOut,
}

impl SessionEvent {
    /// Whether the host should take the user to the login view
    pub fn requires_login(&self) -> bool {
        matches!(self, SessionEvent::Expired | SessionEvent::LoggedOut)
    }
}

/// Cloneable broadcast handle shared by the client and the session store.
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is a normal state, e.g. in one-shot CLI commands
        if self.tx.send(event.clone()).is_err() {
            debug!(?event, "Session event emitted with no subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
