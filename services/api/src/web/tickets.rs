//! services/api/src/web/tickets.rs
//!
//! Short-lived access tickets for stored objects. Issuing a ticket
//! produces an unguessable token that stands in for a signed URL: the
//! file and upload endpoints accept the token instead of requiring the
//! session cookie, so the viewer can pass plain URLs to the renderer.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

/// What a ticket permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    /// Fetching the object. Redeemable any number of times until expiry.
    Read,
    /// Writing the object. Consumed by its first redemption.
    Upload,
}

struct Ticket {
    path: String,
    kind: TicketKind,
    expires_at: Instant,
}

/// The registry of outstanding tickets.
pub struct Tickets {
    inner: Mutex<HashMap<String, Ticket>>,
}

impl Tickets {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a token granting `kind` access to the given store path.
    /// Expired tickets are pruned as a side effect.
    pub async fn issue(&self, path: &str, kind: TicketKind, ttl: Duration) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        inner.retain(|_, t| t.expires_at > now);
        inner.insert(
            token.clone(),
            Ticket {
                path: path.to_string(),
                kind,
                expires_at: now + ttl,
            },
        );
        token
    }

    /// Exchanges a token for its store path, or `None` if the token is
    /// unknown, expired, or of the wrong kind.
    pub async fn redeem(&self, token: &str, kind: TicketKind) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let (ticket_kind, expires_at) = match inner.get(token) {
            Some(t) => (t.kind, t.expires_at),
            None => return None,
        };
        if expires_at <= Instant::now() {
            inner.remove(token);
            return None;
        }
        if ticket_kind != kind {
            return None;
        }
        match kind {
            TicketKind::Upload => inner.remove(token).map(|t| t.path),
            TicketKind::Read => inner.get(token).map(|t| t.path.clone()),
        }
    }
}

impl Default for Tickets {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_tickets_are_reusable() {
        let tickets = Tickets::new();
        let token = tickets
            .issue("pdfs/a.pdf", TicketKind::Read, Duration::from_secs(60))
            .await;
        assert_eq!(
            tickets.redeem(&token, TicketKind::Read).await.as_deref(),
            Some("pdfs/a.pdf")
        );
        assert_eq!(
            tickets.redeem(&token, TicketKind::Read).await.as_deref(),
            Some("pdfs/a.pdf")
        );
    }

    #[tokio::test]
    async fn upload_tickets_are_single_use() {
        let tickets = Tickets::new();
        let token = tickets
            .issue("pdfs/b.pdf", TicketKind::Upload, Duration::from_secs(60))
            .await;
        assert_eq!(
            tickets.redeem(&token, TicketKind::Upload).await.as_deref(),
            Some("pdfs/b.pdf")
        );
        assert_eq!(tickets.redeem(&token, TicketKind::Upload).await, None);
    }

    #[tokio::test]
    async fn expired_tickets_are_refused() {
        let tickets = Tickets::new();
        let token = tickets
            .issue("pdfs/c.pdf", TicketKind::Read, Duration::ZERO)
            .await;
        assert_eq!(tickets.redeem(&token, TicketKind::Read).await, None);
    }

    #[tokio::test]
    async fn kind_mismatches_are_refused() {
        let tickets = Tickets::new();
        let token = tickets
            .issue("pdfs/d.pdf", TicketKind::Read, Duration::from_secs(60))
            .await;
        assert_eq!(tickets.redeem(&token, TicketKind::Upload).await, None);
        // The ticket survives the failed attempt.
        assert!(tickets.redeem(&token, TicketKind::Read).await.is_some());
    }

    #[tokio::test]
    async fn unknown_tokens_are_refused() {
        let tickets = Tickets::new();
        assert_eq!(tickets.redeem("nope", TicketKind::Read).await, None);
    }
}
