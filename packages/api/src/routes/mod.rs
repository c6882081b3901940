pub mod health;
pub mod ingest;
pub mod sessions;
pub mod stream;
