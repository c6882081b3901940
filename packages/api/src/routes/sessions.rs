use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crawler::{ProfessorCard, ScrapeSession};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::app::AppState;
use crate::runner::spawn_crawl;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    pub root_urls: Vec<String>,
    pub objective_prompt: Option<String>,
    pub major: Option<String>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: ScrapeSession,
    pub cards: Vec<ProfessorCard>,
}

/// Create a session row, register its event channel and kick off the crawl.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let session = ScrapeSession::new(
        request.user_id,
        request.root_urls,
        request.objective_prompt,
        request.major,
        request.custom_prompt,
    );

    if let Err(e) = state.store.create_session(&session).await {
        error!(error = %e, "Failed to create session");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    // Channel first, task second: the stream endpoint must be subscribable
    // the moment this response returns.
    let tx = state.registry.open(session.id).await;
    spawn_crawl(
        state.runner.clone(),
        state.registry.clone(),
        session.clone(),
        tx,
        state.stream_grace,
    );

    Ok(Json(SessionResponse {
        session,
        cards: Vec::new(),
    }))
}

/// Fetch a session and all cards persisted for it so far.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let session = state
        .store
        .get_session(id)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch session");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let cards = state.store.list_cards(id).await.map_err(|e| {
        error!(error = %e, "Failed to fetch cards");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(SessionResponse { session, cards }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::offline_state;
    use chrono::Utc;
    use crawler::{SessionStatus, Store};

    fn request() -> CreateSessionRequest {
        CreateSessionRequest {
            user_id: Uuid::new_v4(),
            root_urls: vec!["https://cs.example.edu/".to_string()],
            objective_prompt: None,
            major: Some("Computer Science".to_string()),
            custom_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_create_session_persists_and_opens_channel() {
        let (state, store) = offline_state();

        let Json(response) = create_session(State(state.clone()), Json(request()))
            .await
            .expect("session created");

        assert_eq!(response.session.status, SessionStatus::Queued);
        assert!(response.cards.is_empty());

        let id = response.session.id;
        assert!(store.get_session(id).await.unwrap().is_some());
        // The stream endpoint must be able to subscribe right away.
        assert!(state.registry.claim(id).await.is_some());
    }

    #[tokio::test]
    async fn test_get_session_returns_persisted_cards() {
        let (state, store) = offline_state();

        let session = ScrapeSession::new(
            Uuid::new_v4(),
            vec!["https://cs.example.edu/".to_string()],
            None,
            None,
            None,
        );
        store.create_session(&session).await.unwrap();

        let card = ProfessorCard {
            id: Uuid::new_v4(),
            session_id: session.id,
            professor_name: "Maria Chen".to_string(),
            title: Some("Assistant Professor".to_string()),
            department: Some("Computer Science".to_string()),
            school: None,
            primary_url: Some("https://cs.example.edu/~mchen".to_string()),
            links: Vec::new(),
            summary: Some("Vision research".to_string()),
            keywords: vec!["vision".to_string()],
            research_themes: Vec::new(),
            match_score: 72.0,
            match_reasoning: None,
            evidence_snippets: serde_json::json!([]),
            recent_papers: Vec::new(),
            undergrad_friendly_score: 0.0,
            created_at: Utc::now(),
        };
        store.insert_card(&card).await.unwrap();

        let Json(response) = get_session(State(state), Path(session.id))
            .await
            .expect("session found");
        assert_eq!(response.session.id, session.id);
        assert_eq!(response.cards.len(), 1);
        assert_eq!(response.cards[0].professor_name, "Maria Chen");
    }

    #[tokio::test]
    async fn test_get_unknown_session_is_404() {
        let (state, _store) = offline_state();
        let status = get_session(State(state), Path(Uuid::new_v4()))
            .await
            .err()
            .expect("missing session rejected");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
