//! Two-phase faculty discovery crawler.
//!
//! Phase one (discovery) scans seed pages shallowly for professor stubs;
//! phase two (investigation) fetches each profile, extracts a full record
//! through the LLM gateway, and persists one card per professor. The
//! [`session::SessionRunner`] ties the phases together and owns the session
//! status; progress flows out through [`events::EventSink`].

pub mod config;
pub mod discovery;
pub mod events;
pub mod fetcher;
pub mod filter;
pub mod gateway;
pub mod investigation;
pub mod links;
pub mod prompts;
pub mod salvage;
pub mod session;
pub mod storage;
pub mod text;
pub mod types;

pub use config::{default_models, CrawlLimits, FilterLists, LinkKeywords};
pub use events::{ChannelSink, CrawlPhase, EventSink, NullSink, ProgressEvent};
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use gateway::{ChatApi, DirectoryCandidate, DiscoveryOutcome, ExtractionGateway};
pub use links::LinkClassifier;
pub use session::SessionRunner;
pub use storage::{MemoryStore, PgStore, Store, StoreError};
pub use types::{
    PageArtifact, ProfessorCard, ProfileLink, ScrapeSession, SessionStatus,
};
