//! Identity signal consumed from the authentication layer

use tokio::sync::broadcast;

use crate::types::OwnerId;

/// Authentication transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(OwnerId),
    SignedOut,
}

/// Source of the current identity and its transitions
pub trait AuthSignal: Send + Sync {
    fn current_identity(&self) -> Option<OwnerId>;

    /// Stream of transitions from now on
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
