//! Registry of live session event channels.
//!
//! Each running session owns exactly one channel: the crawl task holds the
//! sender, the stream endpoint claims the receiver. Entries are created
//! before the crawl spawns and removed after a grace period once it ends,
//! so a late subscriber still drains the backlog and sees the terminal
//! event.

use std::collections::HashMap;
use std::sync::Arc;

use crawler::ProgressEvent;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

struct SessionChannel {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    rx: Option<mpsc::UnboundedReceiver<ProgressEvent>>,
}

/// Shared map of session id to event channel. Cheap to clone.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionChannel>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh channel for a session and return the sender the
    /// crawl task writes into. Replaces any previous entry for the id.
    pub async fn open(&self, id: Uuid) -> mpsc::UnboundedSender<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.write().await;
        inner.insert(
            id,
            SessionChannel {
                tx: tx.clone(),
                rx: Some(rx),
            },
        );
        tx
    }

    /// Take the receiver for a session. The stream supports a single
    /// consumer; a second claim (or an unknown id) returns `None`.
    pub async fn claim(&self, id: Uuid) -> Option<mpsc::UnboundedReceiver<ProgressEvent>> {
        let mut inner = self.inner.write().await;
        inner.get_mut(&id).and_then(|channel| channel.rx.take())
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.inner.read().await.contains_key(&id)
    }

    /// Drop the channel. Called once the post-completion grace period ends.
    pub async fn close(&self, id: Uuid) {
        self.inner.write().await.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receiver_claimed_at_most_once() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();

        let tx = registry.open(id).await;
        let mut rx = registry.claim(id).await.expect("first claim");
        assert!(registry.claim(id).await.is_none());

        tx.send(ProgressEvent::info("hello")).unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(ProgressEvent::Info { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_removes_entry() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();

        let _tx = registry.open(id).await;
        assert!(registry.contains(id).await);

        registry.close(id).await;
        assert!(!registry.contains(id).await);
        assert!(registry.claim(id).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_session_has_no_channel() {
        let registry = SessionRegistry::new();
        assert!(!registry.contains(Uuid::new_v4()).await);
        assert!(registry.claim(Uuid::new_v4()).await.is_none());
    }
}
