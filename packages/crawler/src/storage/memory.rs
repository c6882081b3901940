//! In-memory store for tests and local experiments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::types::{PageArtifact, ProfessorCard, ScrapeSession, SessionStatus};

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, ScrapeSession>,
    cards: Vec<ProfessorCard>,
    artifacts: Vec<PageArtifact>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<PageArtifact> {
        self.inner.lock().unwrap().artifacts.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_session(&self, session: &ScrapeSession) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<ScrapeSession>, StoreError> {
        Ok(self.inner.lock().unwrap().sessions.get(&id).cloned())
    }

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        blocked_reason: Option<&str>,
        blocked_url: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(session) = inner.sessions.get_mut(&id) {
            session.status = status;
            if let Some(reason) = blocked_reason {
                session.blocked_reason = Some(reason.to_string());
            }
            if let Some(url) = blocked_url {
                session.blocked_url = Some(url.to_string());
            }
            if status.is_terminal() {
                session.finished_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn insert_card(&self, card: &ProfessorCard) -> Result<(), StoreError> {
        self.inner.lock().unwrap().cards.push(card.clone());
        Ok(())
    }

    async fn list_cards(&self, session_id: Uuid) -> Result<Vec<ProfessorCard>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .cards
            .iter()
            .filter(|card| card.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert_artifact(&self, artifact: &PageArtifact) -> Result<(), StoreError> {
        self.inner.lock().unwrap().artifacts.push(artifact.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = MemoryStore::new();
        let session = ScrapeSession::new(
            Uuid::new_v4(),
            vec!["https://x.edu".to_string()],
            None,
            None,
            None,
        );
        store.create_session(&session).await.unwrap();

        let loaded = store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Queued);
        assert!(loaded.finished_at.is_none());

        store
            .update_session_status(session.id, SessionStatus::Error, Some("low yield"), None)
            .await
            .unwrap();
        let loaded = store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Error);
        assert_eq!(loaded.blocked_reason.as_deref(), Some("low yield"));
        assert!(loaded.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_session_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_session(Uuid::new_v4()).await.unwrap().is_none());
    }
}
