//! Persistence seam for sessions, cards and raw page artifacts.
//!
//! The crawl pipeline only ever talks to [`Store`]; Postgres backs the real
//! service and [`MemoryStore`] backs tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{PageArtifact, ProfessorCard, ScrapeSession, SessionStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_session(&self, session: &ScrapeSession) -> Result<(), StoreError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<ScrapeSession>, StoreError>;

    /// Set the session status. `blocked_reason` and `blocked_url` are only
    /// written when provided; a terminal status also stamps `finished_at`.
    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        blocked_reason: Option<&str>,
        blocked_url: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn insert_card(&self, card: &ProfessorCard) -> Result<(), StoreError>;

    /// Cards for a session in insertion order.
    async fn list_cards(&self, session_id: Uuid) -> Result<Vec<ProfessorCard>, StoreError>;

    async fn insert_artifact(&self, artifact: &PageArtifact) -> Result<(), StoreError>;

    /// Cheap connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
