use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chat_client::truncate_to_char_boundary;
use chrono::Utc;
use crawler::PageArtifact;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::app::AppState;

/// Stored HTML is a snippet, not the page.
const HTML_SNIPPET_LIMIT: usize = 2000;

/// Raw page payload pushed by the browser extension.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub session_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub html: Option<String>,
}

pub async fn ingest_artifact(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let artifact = PageArtifact {
        id: Uuid::new_v4(),
        session_id: request.session_id,
        source: "chrome_extension".to_string(),
        url: request.url,
        title: request.title,
        extracted_text: request.content,
        html_snippet: request
            .html
            .as_deref()
            .map(|h| truncate_to_char_boundary(h, HTML_SNIPPET_LIMIT).to_string()),
        created_at: Utc::now(),
    };

    info!(url = %artifact.url, session_id = %artifact.session_id, "Ingesting artifact");

    if let Err(e) = state.store.insert_artifact(&artifact).await {
        error!(error = %e, "Failed to ingest artifact");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Artifact ingested",
    })))
}
