//! HTTP layer over the faculty discovery crawler.
//!
//! Keeps the surface thin: session create/read, a per-session SSE progress
//! stream, an artifact ingest inlet and a health check. All crawl logic
//! lives in the `crawler` package.

pub mod app;
pub mod config;
pub mod registry;
pub mod routes;
pub mod runner;

pub use app::{build_app, AppState};
pub use config::Config;
pub use registry::SessionRegistry;
