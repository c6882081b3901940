use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::app::AppState;

/// Liveness plus a bounded database connectivity check.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let ping = tokio::time::timeout(Duration::from_secs(5), state.store.ping()).await;

    match ping {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "message": "Welcome to the faculty discovery API",
            })),
        ),
        Ok(Err(e)) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded", "detail": "database unreachable"})),
            )
        }
        Err(_) => {
            error!("Health check timed out");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded", "detail": "database ping timed out"})),
            )
        }
    }
}
