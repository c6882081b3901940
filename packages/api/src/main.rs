// Main entry point for the faculty discovery API server

use std::sync::Arc;

use anyhow::{Context, Result};
use api_core::{build_app, AppState, Config, SessionRegistry};
use chat_client::ChatClient;
use crawler::{
    CrawlLimits, ExtractionGateway, HttpFetcher, LinkClassifier, PgStore, SessionRunner,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api_core=debug,crawler=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting faculty discovery API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire the crawl pipeline
    let chat = match &config.llm_base_url {
        Some(url) => ChatClient::new(config.llm_api_key.clone()).with_base_url(url.clone()),
        None => ChatClient::new(config.llm_api_key.clone()),
    };
    let limits = CrawlLimits::default();
    let gateway = ExtractionGateway::new(Arc::new(chat), config.llm_models.clone(), limits.clone());
    let store = Arc::new(PgStore::new(pool));

    let runner = Arc::new(SessionRunner {
        fetcher: Arc::new(HttpFetcher::new().context("Failed to create page fetcher")?),
        gateway: Arc::new(gateway),
        classifier: LinkClassifier::default(),
        limits,
        store: store.clone(),
    });

    let state = AppState {
        store,
        registry: SessionRegistry::new(),
        runner,
        stream_grace: config.stream_grace,
    };
    let app = build_app(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
