//! In-process [`AuthSignal`] implementation
//!
//! Holds the current identity and broadcasts transitions. Suitable for the
//! CLI, embedding in tests, or bridging an external auth client.

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::traits::{AuthEvent, AuthSignal};
use crate::types::OwnerId;

const EVENT_CAPACITY: usize = 16;

/// Identity holder that publishes sign-in and sign-out events
pub struct SessionAuth {
    identity: RwLock<Option<OwnerId>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionAuth {
    /// Start anonymous
    pub fn anonymous() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            identity: RwLock::new(None),
            events,
        }
    }

    /// Start already signed in; no event is published for the initial identity
    pub fn signed_in(owner: impl Into<OwnerId>) -> Self {
        let session = Self::anonymous();
        *session.identity.write() = Some(owner.into());
        session
    }

    pub fn sign_in(&self, owner: impl Into<OwnerId>) {
        let owner = owner.into();
        *self.identity.write() = Some(owner.clone());
        debug!(owner = %owner, "Signed in");
        // No receivers is fine
        let _ = self.events.send(AuthEvent::SignedIn(owner));
    }

    pub fn sign_out(&self) {
        let previous = self.identity.write().take();
        if previous.is_some() {
            debug!("Signed out");
            let _ = self.events.send(AuthEvent::SignedOut);
        }
    }
}

impl Default for SessionAuth {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl AuthSignal for SessionAuth {
    fn current_identity(&self) -> Option<OwnerId> {
        self.identity.read().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
