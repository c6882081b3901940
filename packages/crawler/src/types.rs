use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lifecycle status. `Done`, `Error` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Queued,
    Running,
    Done,
    Error,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Queued => "queued",
            SessionStatus::Running => "running",
            SessionStatus::Done => "done",
            SessionStatus::Error => "error",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(SessionStatus::Queued),
            "running" => Some(SessionStatus::Running),
            "done" => Some(SessionStatus::Done),
            "error" => Some(SessionStatus::Error),
            "failed" => Some(SessionStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Done | SessionStatus::Error | SessionStatus::Failed
        )
    }
}

/// One bounded crawl request scoped to a set of seed URLs and a relevance goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub root_urls: Vec<String>,
    pub objective_prompt: Option<String>,
    pub major: Option<String>,
    pub custom_prompt: Option<String>,
    pub status: SessionStatus,
    pub blocked_reason: Option<String>,
    pub blocked_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScrapeSession {
    pub fn new(
        user_id: Uuid,
        root_urls: Vec<String>,
        objective_prompt: Option<String>,
        major: Option<String>,
        custom_prompt: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            root_urls,
            objective_prompt,
            major,
            custom_prompt,
            status: SessionStatus::Queued,
            blocked_reason: None,
            blocked_url: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// The relevance context handed to profile extraction: the custom prompt
    /// when provided, otherwise derived from the major, otherwise none.
    pub fn search_context(&self) -> Option<String> {
        if let Some(prompt) = self.custom_prompt.as_ref().filter(|p| !p.trim().is_empty()) {
            return Some(prompt.clone());
        }
        self.major
            .as_ref()
            .filter(|m| !m.trim().is_empty())
            .map(|m| format!("Research in {}", m))
    }
}

/// A pending discovery page. Depth is 0 for seeds and 1 for harvested links;
/// nothing deeper is ever fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlQueueEntry {
    pub url: String,
    pub depth: u8,
}

/// A labeled outbound link on a professor's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLink {
    pub label: String,
    pub url: String,
}

/// A lightweight candidate professor record awaiting deep investigation.
#[derive(Debug, Clone)]
pub struct ProfessorStub {
    pub name: String,
    pub profile_url: Option<String>,
    pub source_url: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub snippet: Option<String>,
    /// Full profile data captured during discovery when the scanned page
    /// itself was an individual profile (skips the investigation re-fetch).
    pub full_data: Option<ExtractedProfile>,
}

impl ProfessorStub {
    pub fn minimal(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_url: None,
            source_url: source_url.into(),
            title: None,
            email: None,
            snippet: None,
            full_data: None,
        }
    }
}

/// Transient LLM output for one profile page. Never persisted directly;
/// always merged into a `ProfessorCard`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedProfile {
    pub professor_name: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub school: Option<String>,
    pub email: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub links: Vec<ProfileLink>,
    pub match_score: Option<f32>,
    pub match_reasoning: Option<String>,
    /// Set when the model reported the person invalid/inactive, or when
    /// extraction failed after exhausting all models.
    pub error: Option<String>,
}

impl ExtractedProfile {
    /// Degraded record carrying only the name. Used when fetch or extraction
    /// fails so the professor is never silently dropped.
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            professor_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Lenient conversion from raw LLM JSON. Model output is near-schema at
    /// best: fields are picked individually and malformed entries (non-object
    /// links, non-string keywords) are skipped rather than failing the whole
    /// profile.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let keywords = value
            .get("keywords")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|k| k.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let links = value
            .get("links")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let url = item.get("url")?.as_str()?.to_string();
                        let label = item
                            .get("label")
                            .and_then(|l| l.as_str())
                            .unwrap_or("Link")
                            .to_string();
                        Some(ProfileLink { label, url })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            professor_name: text("professor_name"),
            title: text("title"),
            department: text("department"),
            school: text("school"),
            email: text("email"),
            summary: text("summary"),
            keywords,
            links,
            match_score: value
                .get("match_score")
                .and_then(|v| v.as_f64())
                .map(|s| s as f32),
            match_reasoning: text("match_reasoning"),
            error: text("error"),
        }
    }
}

/// The final persisted, user-facing record for one professor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessorCard {
    pub id: Uuid,
    pub session_id: Uuid,
    pub professor_name: String,
    pub title: Option<String>,
    pub department: Option<String>,
    pub school: Option<String>,
    pub primary_url: Option<String>,
    /// Ordered, deduplicated by url
    pub links: Vec<ProfileLink>,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub research_themes: Vec<String>,
    /// Relevance to the user's stated interest, 0–100
    pub match_score: f32,
    pub match_reasoning: Option<String>,
    pub evidence_snippets: serde_json::Value,
    pub recent_papers: Vec<serde_json::Value>,
    pub undergrad_friendly_score: f32,
    pub created_at: DateTime<Utc>,
}

/// A raw page artifact pushed through the ingest inlet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageArtifact {
    pub id: Uuid,
    pub session_id: Uuid,
    pub source: String,
    pub url: String,
    pub title: Option<String>,
    pub extracted_text: Option<String>,
    pub html_snippet: Option<String>,
    pub created_at: DateTime<Utc>,
}
