use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use crawler::{SessionRunner, Store};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::registry::SessionRegistry;
use crate::routes;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub registry: SessionRegistry,
    pub runner: Arc<SessionRunner>,
    pub stream_grace: Duration,
}

/// Build the axum router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/sessions", post(routes::sessions::create_session))
        .route("/sessions/:id", get(routes::sessions::get_session))
        .route("/sessions/:id/stream", get(routes::stream::stream_session))
        .route("/ingest", post(routes::ingest::ingest_artifact))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use chat_client::{ChatError, ChatRequest, ChatResponse};
    use crawler::{
        default_models, ChatApi, CrawlLimits, ExtractionGateway, FetchError, LinkClassifier,
        MemoryStore, PageFetcher,
    };

    struct OfflineChat;

    #[async_trait]
    impl ChatApi for OfflineChat {
        async fn chat_completion(
            &self,
            _request: ChatRequest,
        ) -> Result<ChatResponse, ChatError> {
            Err(ChatError::Config("offline".to_string()))
        }
    }

    struct OfflineFetcher;

    #[async_trait]
    impl PageFetcher for OfflineFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Network {
                url: url.to_string(),
                message: "offline".to_string(),
            })
        }
    }

    /// App state over an in-memory store and a pipeline that cannot reach
    /// the network. Exercises the HTTP layer without real crawling.
    pub fn offline_state() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let limits = CrawlLimits::default();
        let gateway =
            ExtractionGateway::new(Arc::new(OfflineChat), default_models(), limits.clone());

        let runner = Arc::new(SessionRunner {
            fetcher: Arc::new(OfflineFetcher),
            gateway: Arc::new(gateway),
            classifier: LinkClassifier::default(),
            limits,
            store: store.clone(),
        });

        let state = AppState {
            store: store.clone(),
            registry: SessionRegistry::new(),
            runner,
            stream_grace: Duration::from_secs(5),
        };
        (state, store)
    }
}
