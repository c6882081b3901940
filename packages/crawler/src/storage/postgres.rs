//! Postgres-backed store. List-valued fields live in JSONB columns so the
//! schema stays flat.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::types::{PageArtifact, ProfessorCard, ScrapeSession, SessionStatus};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    root_urls: serde_json::Value,
    objective_prompt: Option<String>,
    major: Option<String>,
    custom_prompt: Option<String>,
    status: String,
    blocked_reason: Option<String>,
    blocked_url: Option<String>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<SessionRow> for ScrapeSession {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, StoreError> {
        let status = SessionStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown session status {}", row.status)))?;
        Ok(ScrapeSession {
            id: row.id,
            user_id: row.user_id,
            root_urls: serde_json::from_value(row.root_urls)?,
            objective_prompt: row.objective_prompt,
            major: row.major,
            custom_prompt: row.custom_prompt,
            status,
            blocked_reason: row.blocked_reason,
            blocked_url: row.blocked_url,
            created_at: row.created_at,
            finished_at: row.finished_at,
        })
    }
}

#[derive(FromRow)]
struct CardRow {
    id: Uuid,
    session_id: Uuid,
    professor_name: String,
    title: Option<String>,
    department: Option<String>,
    school: Option<String>,
    primary_url: Option<String>,
    links: serde_json::Value,
    summary: Option<String>,
    keywords: serde_json::Value,
    research_themes: serde_json::Value,
    match_score: f32,
    match_reasoning: Option<String>,
    evidence_snippets: serde_json::Value,
    recent_papers: serde_json::Value,
    undergrad_friendly_score: f32,
    created_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for ProfessorCard {
    type Error = StoreError;

    fn try_from(row: CardRow) -> Result<Self, StoreError> {
        Ok(ProfessorCard {
            id: row.id,
            session_id: row.session_id,
            professor_name: row.professor_name,
            title: row.title,
            department: row.department,
            school: row.school,
            primary_url: row.primary_url,
            links: serde_json::from_value(row.links)?,
            summary: row.summary,
            keywords: serde_json::from_value(row.keywords)?,
            research_themes: serde_json::from_value(row.research_themes)?,
            match_score: row.match_score,
            match_reasoning: row.match_reasoning,
            evidence_snippets: row.evidence_snippets,
            recent_papers: serde_json::from_value(row.recent_papers)?,
            undergrad_friendly_score: row.undergrad_friendly_score,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_session(&self, session: &ScrapeSession) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO scrape_sessions
                (id, user_id, root_urls, objective_prompt, major, custom_prompt,
                 status, blocked_reason, blocked_url, created_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(serde_json::to_value(&session.root_urls)?)
        .bind(&session.objective_prompt)
        .bind(&session.major)
        .bind(&session.custom_prompt)
        .bind(session.status.as_str())
        .bind(&session.blocked_reason)
        .bind(&session.blocked_url)
        .bind(session.created_at)
        .bind(session.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<ScrapeSession>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, root_urls, objective_prompt, major, custom_prompt,
                   status, blocked_reason, blocked_url, created_at, finished_at
            FROM scrape_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ScrapeSession::try_from).transpose()
    }

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        blocked_reason: Option<&str>,
        blocked_url: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE scrape_sessions
            SET status = $2,
                blocked_reason = COALESCE($3, blocked_reason),
                blocked_url = COALESCE($4, blocked_url),
                finished_at = CASE WHEN $5 THEN NOW() ELSE finished_at END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(blocked_reason)
        .bind(blocked_url)
        .bind(status.is_terminal())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_card(&self, card: &ProfessorCard) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO professor_cards
                (id, session_id, professor_name, title, department, school,
                 primary_url, links, summary, keywords, research_themes,
                 match_score, match_reasoning, evidence_snippets, recent_papers,
                 undergrad_friendly_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(card.id)
        .bind(card.session_id)
        .bind(&card.professor_name)
        .bind(&card.title)
        .bind(&card.department)
        .bind(&card.school)
        .bind(&card.primary_url)
        .bind(serde_json::to_value(&card.links)?)
        .bind(&card.summary)
        .bind(serde_json::to_value(&card.keywords)?)
        .bind(serde_json::to_value(&card.research_themes)?)
        .bind(card.match_score)
        .bind(&card.match_reasoning)
        .bind(&card.evidence_snippets)
        .bind(serde_json::to_value(&card.recent_papers)?)
        .bind(card.undergrad_friendly_score)
        .bind(card.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_cards(&self, session_id: Uuid) -> Result<Vec<ProfessorCard>, StoreError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, session_id, professor_name, title, department, school,
                   primary_url, links, summary, keywords, research_themes,
                   match_score, match_reasoning, evidence_snippets, recent_papers,
                   undergrad_friendly_score, created_at
            FROM professor_cards
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProfessorCard::try_from).collect()
    }

    async fn insert_artifact(&self, artifact: &PageArtifact) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO scrape_artifacts
                (id, session_id, source, url, title, extracted_text, html_snippet, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(artifact.id)
        .bind(artifact.session_id)
        .bind(&artifact.source)
        .bind(&artifact.url)
        .bind(&artifact.title)
        .bind(&artifact.extracted_text)
        .bind(&artifact.html_snippet)
        .bind(artifact.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
