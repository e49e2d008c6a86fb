//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the auth event bus.

use crate::config::Config;
use crate::web::tickets::Tickets;
use shelf_core::ports::{DatabaseService, ObjectStorageService};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub storage: Arc<dyn ObjectStorageService>,
    pub config: Arc<Config>,
    pub tickets: Arc<Tickets>,
    pub auth_events: AuthEvents,
}

//=========================================================================================
// Auth Event Bus
//=========================================================================================

/// A sign-in or sign-out that just happened somewhere in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: Uuid },
    SignedOut { user_id: Uuid },
}

/// Broadcast bus for auth lifecycle events. Open viewer connections
/// subscribe so that a sign-out elsewhere closes them immediately,
/// rather than each connection polling the session table.
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self { tx }
    }

    /// Publishes an event. A send error only means nobody is listening.
    pub fn publish(&self, event: AuthEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = AuthEvents::new();
        let mut rx = bus.subscribe();
        let user_id = Uuid::new_v4();
        bus.publish(AuthEvent::SignedOut { user_id });
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut { user_id });
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_harmless() {
        let bus = AuthEvents::new();
        bus.publish(AuthEvent::SignedIn {
            user_id: Uuid::new_v4(),
        });
    }
}
