//! Phase two: deep dive into each discovered professor.
//!
//! Every stub yields exactly one card, even when the profile fetch or the
//! extraction fails; in that case the card degrades to whatever the
//! directory row carried. An external lab or personal site found among the
//! profile links is fetched once and the extraction re-run over the combined
//! text for a richer summary.

use std::collections::HashSet;
use std::time::Instant;

use chat_client::truncate_to_char_boundary;
use chrono::Utc;
use tracing::{error, info, warn};
use url::Url;

use crate::config::CrawlLimits;
use crate::events::{CrawlPhase, EventSink, ProgressEvent};
use crate::fetcher::PageFetcher;
use crate::gateway::ExtractionGateway;
use crate::prompts::EXTERNAL_CONTENT_MARKER;
use crate::storage::Store;
use crate::text;
use crate::types::{
    ExtractedProfile, ProfessorCard, ProfessorStub, ProfileLink, ScrapeSession,
};

/// Link labels worth a second fetch.
const EXTERNAL_LABELS: [&str; 4] = ["lab", "personal", "research group", "homepage"];

#[derive(Debug)]
pub struct InvestigationRun {
    pub cards: Vec<ProfessorCard>,
    /// Running page total for the session (discovery pages included).
    pub pages_scanned: usize,
}

pub struct InvestigationEngine<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub gateway: &'a ExtractionGateway,
    pub limits: &'a CrawlLimits,
}

impl<'a> InvestigationEngine<'a> {
    /// Investigate stubs in discovery order, up to the professor cap or the
    /// session deadline. Cards are persisted as they are produced so a
    /// timeout still leaves partial results behind.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        session: &ScrapeSession,
        stubs: Vec<ProfessorStub>,
        visited: &mut HashSet<String>,
        store: &dyn Store,
        sink: &dyn EventSink,
        deadline: Instant,
        pages_scanned: usize,
    ) -> InvestigationRun {
        let total = stubs.len().min(self.limits.max_professors);
        sink.emit(ProgressEvent::Phase {
            phase: CrawlPhase::Investigation,
            message: format!("Discovery complete. Investigating {total} professors..."),
        });

        let mut run = InvestigationRun {
            cards: Vec::new(),
            pages_scanned,
        };
        let context = session.search_context();

        for (index, stub) in stubs.into_iter().take(total).enumerate() {
            if Instant::now() >= deadline {
                sink.emit(ProgressEvent::info(
                    "Time limit reached. Saving collected data...",
                ));
                break;
            }

            sink.emit(ProgressEvent::Investigating {
                name: stub.name.clone(),
                step: "profile".to_string(),
                progress: format!("{}/{total}", index + 1),
                message: format!("Investigating: {}", stub.name),
            });

            let card = self
                .investigate(session, stub, visited, context.as_deref(), sink, &mut run)
                .await;

            if let Err(e) = store.insert_card(&card).await {
                error!(error = %e, professor = %card.professor_name, "Failed to save card");
            }

            sink.emit(ProgressEvent::FoundCard {
                name: card.professor_name.clone(),
                department: card
                    .department
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                title: card.title.clone().unwrap_or_default(),
                links_count: card.links.len(),
                summary: truncate_to_char_boundary(card.summary.as_deref().unwrap_or(""), 100)
                    .to_string(),
            });
            run.cards.push(card);

            tokio::time::sleep(self.limits.stub_delay).await;
        }

        info!(cards = run.cards.len(), "Investigation finished");
        run
    }

    /// Build one card from one stub.
    async fn investigate(
        &self,
        session: &ScrapeSession,
        stub: ProfessorStub,
        visited: &mut HashSet<String>,
        context: Option<&str>,
        sink: &dyn EventSink,
        run: &mut InvestigationRun,
    ) -> ProfessorCard {
        let mut profile_url = stub.profile_url.clone();
        let mut profile_text = String::new();

        let mut profile = if let Some(full) = stub.full_data.clone() {
            full
        } else if let Some(url) = profile_url.clone().filter(|u| !visited.contains(u)) {
            visited.insert(url.clone());
            match self.fetcher.fetch(&url).await {
                Ok(html) => {
                    sink.emit(ProgressEvent::Scanning {
                        url: url.clone(),
                        depth: 1,
                        pages_crawled: run.pages_scanned,
                        found: run.cards.len(),
                    });
                    run.pages_scanned += 1;
                    profile_text = text::page_text(&html);

                    let extracted = self
                        .gateway
                        .extract_profile(&profile_text, &url, &stub.name, context, sink)
                        .await;
                    if let Some(reason) = extracted.error.clone() {
                        sink.emit(ProgressEvent::info(format!(
                            "Using directory info (analysis failed: {reason})"
                        )));
                        profile_url = None;
                        ExtractedProfile::name_only(&stub.name)
                    } else {
                        extracted
                    }
                }
                Err(e) => {
                    warn!(error = %e, professor = %stub.name, "Profile fetch failed");
                    profile_url = None;
                    ExtractedProfile::name_only(&stub.name)
                }
            }
        } else {
            ExtractedProfile::name_only(&stub.name)
        };

        // Backfill from the directory row whatever extraction left blank.
        if profile.title.is_none() {
            profile.title = stub.title.clone();
        }
        if profile.summary.is_none() {
            profile.summary = stub.snippet.clone();
        }
        if profile.school.is_none()
            && profile_url
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains("illinois"))
        {
            profile.school = Some("University of Illinois Urbana-Champaign".to_string());
        }

        let base_url = profile_url.clone().unwrap_or_else(|| stub.source_url.clone());
        let mut links = resolve_links(&profile.links, &base_url);

        if let Some(external_url) = external_site(&links, profile_url.as_deref()) {
            self.deep_dive(
                &stub.name,
                &external_url,
                &base_url,
                &profile_text,
                context,
                &mut profile,
                &mut links,
                sink,
            )
            .await;
        }

        if !links.is_empty() {
            let labels: Vec<&str> = links.iter().take(4).map(|l| l.label.as_str()).collect();
            sink.emit(ProgressEvent::info(format!(
                "Found links: {}",
                labels.join(", ")
            )));
        }

        ProfessorCard {
            id: uuid::Uuid::new_v4(),
            session_id: session.id,
            professor_name: profile
                .professor_name
                .clone()
                .unwrap_or_else(|| stub.name.clone()),
            title: profile.title.clone(),
            department: profile.department.clone(),
            school: profile.school.clone(),
            primary_url: profile_url.or_else(|| Some(stub.source_url.clone())),
            links,
            summary: profile.summary.clone(),
            keywords: profile.keywords.clone(),
            research_themes: Vec::new(),
            match_score: profile.match_score.unwrap_or(0.0),
            match_reasoning: profile.match_reasoning.clone(),
            evidence_snippets: serde_json::Value::Array(Vec::new()),
            recent_papers: Vec::new(),
            undergrad_friendly_score: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Fetch the professor's external site and re-extract over the combined
    /// text, keeping only strict improvements.
    #[allow(clippy::too_many_arguments)]
    async fn deep_dive(
        &self,
        name: &str,
        external_url: &str,
        identity_url: &str,
        profile_text: &str,
        context: Option<&str>,
        profile: &mut ExtractedProfile,
        links: &mut Vec<ProfileLink>,
        sink: &dyn EventSink,
    ) {
        sink.emit(ProgressEvent::info(format!(
            "Deep Dive: Investigating external site: {external_url}"
        )));

        let external_html = match self.fetcher.fetch(external_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, url = %external_url, "Deep dive fetch failed");
                sink.emit(ProgressEvent::info(format!(
                    "Could not access external site: {external_url}"
                )));
                return;
            }
        };

        let combined = format!(
            "{profile_text}\n\n{EXTERNAL_CONTENT_MARKER}\n\n{}",
            text::page_text(&external_html)
        );
        let deep = self
            .gateway
            .extract_profile(&combined, identity_url, name, context, sink)
            .await;
        if deep.error.is_some() {
            return;
        }

        // Summary only when strictly richer.
        if let Some(deep_summary) = deep.summary {
            if deep_summary.len() > profile.summary.as_deref().map_or(0, str::len) {
                profile.summary = Some(deep_summary);
            }
        }
        for keyword in deep.keywords {
            if !profile.keywords.contains(&keyword) {
                profile.keywords.push(keyword);
            }
        }
        for link in resolve_links(&deep.links, external_url) {
            if !links.iter().any(|existing| existing.url == link.url) {
                links.push(link);
            }
        }

        sink.emit(ProgressEvent::info(
            "Deep investigation successful. Updated profile data.",
        ));
    }
}

/// Resolve relative link URLs against the page they were extracted from.
fn resolve_links(links: &[ProfileLink], base_url: &str) -> Vec<ProfileLink> {
    let base = Url::parse(base_url).ok();
    links
        .iter()
        .map(|link| {
            let url = match &base {
                Some(base) if !link.url.starts_with("http") => base
                    .join(&link.url)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| link.url.clone()),
                _ => link.url.clone(),
            };
            ProfileLink {
                label: link.label.clone(),
                url,
            }
        })
        .collect()
}

/// First link that looks like the professor's own site. Google Scholar and
/// the profile page itself are not worth a second fetch.
fn external_site(links: &[ProfileLink], profile_url: Option<&str>) -> Option<String> {
    links
        .iter()
        .find(|link| {
            let label = link.label.to_lowercase();
            EXTERNAL_LABELS.iter().any(|term| label.contains(*term))
                && Some(link.url.as_str()) != profile_url
                && !link.url.contains("scholar.google")
        })
        .map(|link| link.url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::RecordingSink;
    use crate::fetcher::testing::MapFetcher;
    use crate::gateway::testing::{ok, ScriptedChat};
    use crate::storage::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn limits() -> CrawlLimits {
        CrawlLimits {
            stub_delay: Duration::from_millis(1),
            ..CrawlLimits::default()
        }
    }

    fn session() -> ScrapeSession {
        ScrapeSession::new(
            Uuid::new_v4(),
            vec!["https://cs.x.edu/faculty".to_string()],
            None,
            Some("Computer Science".to_string()),
            None,
        )
    }

    fn stub(name: &str, profile_url: Option<&str>) -> ProfessorStub {
        ProfessorStub {
            profile_url: profile_url.map(String::from),
            title: Some("Professor".to_string()),
            snippet: Some("Works on vision.".to_string()),
            ..ProfessorStub::minimal(name, "https://cs.x.edu/faculty")
        }
    }

    async fn run(
        fetcher: MapFetcher,
        chat: ScriptedChat,
        stubs: Vec<ProfessorStub>,
        crawl_limits: CrawlLimits,
    ) -> (InvestigationRun, Vec<ProfessorCard>, RecordingSink) {
        let gateway =
            ExtractionGateway::new(Arc::new(chat), vec!["m".to_string()], crawl_limits.clone());
        let engine = InvestigationEngine {
            fetcher: &fetcher,
            gateway: &gateway,
            limits: &crawl_limits,
        };
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let session = session();
        store.create_session(&session).await.unwrap();

        let mut visited = HashSet::new();
        let result = engine
            .run(
                &session,
                stubs,
                &mut visited,
                &store,
                &sink,
                Instant::now() + Duration::from_secs(60),
                0,
            )
            .await;
        let saved = store.list_cards(session.id).await.unwrap();
        (result, saved, sink)
    }

    #[tokio::test]
    async fn test_profile_extraction_and_stub_merge() {
        let fetcher = MapFetcher::new([(
            "https://cs.x.edu/people/chen",
            "<p>Maria Chen is an assistant professor.</p>",
        )]);
        // Extraction returns no title, so the stub's survives the merge
        let chat = ScriptedChat::new(vec![ok(
            r#"{
                "professor_name": "Maria Chen",
                "department": "Computer Science",
                "summary": "Studies robot perception and embodied AI systems.",
                "keywords": ["robotics", "vision"],
                "links": [{"label": "CV", "url": "/cv.pdf"}],
                "match_score": 85,
                "match_reasoning": "Strong overlap."
            }"#,
        )]);

        let (result, saved, _) = run(
            fetcher,
            chat,
            vec![stub("Maria Chen", Some("https://cs.x.edu/people/chen"))],
            limits(),
        )
        .await;

        assert_eq!(result.cards.len(), 1);
        assert_eq!(saved.len(), 1);
        let card = &result.cards[0];
        assert_eq!(card.professor_name, "Maria Chen");
        assert_eq!(card.title.as_deref(), Some("Professor"));
        assert_eq!(card.department.as_deref(), Some("Computer Science"));
        assert_eq!(card.primary_url.as_deref(), Some("https://cs.x.edu/people/chen"));
        assert_eq!(card.links[0].url, "https://cs.x.edu/cv.pdf");
        assert_eq!(card.match_score, 85.0);
        assert_eq!(result.pages_scanned, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_directory_card() {
        let fetcher = MapFetcher::new(std::iter::empty::<(&str, &str)>());
        let chat = ScriptedChat::new(vec![]);

        let (result, _, _) = run(
            fetcher,
            chat,
            vec![stub("Maria Chen", Some("https://cs.x.edu/gone"))],
            limits(),
        )
        .await;

        let card = &result.cards[0];
        assert_eq!(card.professor_name, "Maria Chen");
        assert_eq!(card.title.as_deref(), Some("Professor"));
        assert_eq!(card.summary.as_deref(), Some("Works on vision."));
        // Primary URL falls back to the directory page
        assert_eq!(card.primary_url.as_deref(), Some("https://cs.x.edu/faculty"));
        assert_eq!(card.match_score, 0.0);
    }

    #[tokio::test]
    async fn test_model_reported_error_degrades_to_directory_card() {
        let fetcher = MapFetcher::new([("https://cs.x.edu/people/old", "<p>In memoriam</p>")]);
        let chat = ScriptedChat::new(vec![ok(
            r#"{"error": "Person is deceased/alumni/inactive"}"#,
        )]);

        let (result, _, sink) = run(
            fetcher,
            chat,
            vec![stub("Old Professor", Some("https://cs.x.edu/people/old"))],
            limits(),
        )
        .await;

        let card = &result.cards[0];
        assert_eq!(card.professor_name, "Old Professor");
        assert_eq!(card.primary_url.as_deref(), Some("https://cs.x.edu/faculty"));
        assert!(sink.events().iter().any(|e| matches!(
            e,
            ProgressEvent::Info { message } if message.contains("analysis failed")
        )));
    }

    #[tokio::test]
    async fn test_full_data_stub_skips_refetch() {
        let fetcher = MapFetcher::new(std::iter::empty::<(&str, &str)>());
        let chat = ScriptedChat::new(vec![]);

        let mut prefilled = stub("Maria Chen", Some("https://cs.x.edu/people/chen"));
        prefilled.full_data = Some(ExtractedProfile {
            professor_name: Some("Maria Chen".to_string()),
            summary: Some("Already extracted during discovery.".to_string()),
            match_score: Some(70.0),
            ..Default::default()
        });

        let (result, _, _) = run(fetcher, chat, vec![prefilled], limits()).await;

        let card = &result.cards[0];
        assert_eq!(
            card.summary.as_deref(),
            Some("Already extracted during discovery.")
        );
        assert_eq!(result.pages_scanned, 0);
    }

    #[tokio::test]
    async fn test_deep_dive_merges_improvements() {
        let fetcher = MapFetcher::new([
            (
                "https://cs.x.edu/people/chen",
                "<p>Maria Chen, assistant professor.</p>",
            ),
            (
                "https://chenlab.x.edu/",
                "<p>The Chen Lab studies embodied robot perception at scale.</p>",
            ),
        ]);
        let chat = ScriptedChat::new(vec![
            ok(r#"{
                "professor_name": "Maria Chen",
                "summary": "Short bio.",
                "keywords": ["robotics"],
                "links": [
                    {"label": "Lab Website", "url": "https://chenlab.x.edu/"},
                    {"label": "Google Scholar", "url": "https://scholar.google.com/chen"}
                ],
                "match_score": 80
            }"#),
            ok(r#"{
                "professor_name": "Maria Chen",
                "summary": "A much longer summary derived from the lab site content.",
                "keywords": ["robotics", "embodied AI"],
                "links": [{"label": "Publications", "url": "/pubs"}]
            }"#),
        ]);

        let (result, _, sink) = run(
            fetcher,
            chat,
            vec![stub("Maria Chen", Some("https://cs.x.edu/people/chen"))],
            limits(),
        )
        .await;

        let card = &result.cards[0];
        assert_eq!(
            card.summary.as_deref(),
            Some("A much longer summary derived from the lab site content.")
        );
        assert_eq!(card.keywords, vec!["robotics", "embodied AI"]);
        // Lab link kept, Scholar kept, new publications link appended resolved
        assert_eq!(card.links.len(), 3);
        assert_eq!(card.links[2].url, "https://chenlab.x.edu/pubs");
        // Deep dive keeps the discovery-time score
        assert_eq!(card.match_score, 80.0);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            ProgressEvent::Info { message } if message.contains("Deep Dive")
        )));
    }

    #[tokio::test]
    async fn test_deep_dive_keeps_longer_existing_summary() {
        let fetcher = MapFetcher::new([
            (
                "https://cs.x.edu/people/chen",
                "<p>Maria Chen, assistant professor.</p>",
            ),
            ("https://chenlab.x.edu/", "<p>Lab page.</p>"),
        ]);
        let chat = ScriptedChat::new(vec![
            ok(r#"{
                "professor_name": "Maria Chen",
                "summary": "A detailed original summary that is quite long already.",
                "links": [{"label": "Lab", "url": "https://chenlab.x.edu/"}]
            }"#),
            ok(r#"{"professor_name": "Maria Chen", "summary": "Terse."}"#),
        ]);

        let (result, _, _) = run(
            fetcher,
            chat,
            vec![stub("Maria Chen", Some("https://cs.x.edu/people/chen"))],
            limits(),
        )
        .await;

        assert_eq!(
            result.cards[0].summary.as_deref(),
            Some("A detailed original summary that is quite long already.")
        );
    }

    #[tokio::test]
    async fn test_scholar_link_is_not_deep_dived() {
        let fetcher = MapFetcher::new([(
            "https://cs.x.edu/people/chen",
            "<p>Maria Chen.</p>",
        )]);
        let chat = ScriptedChat::new(vec![ok(r#"{
            "professor_name": "Maria Chen",
            "links": [{"label": "Personal Scholar Page", "url": "https://scholar.google.com/chen"}]
        }"#)]);

        let (result, _, _) = run(
            fetcher,
            chat,
            vec![stub("Maria Chen", Some("https://cs.x.edu/people/chen"))],
            limits(),
        )
        .await;

        // Only the profile page was fetched
        assert_eq!(result.pages_scanned, 1);
        assert_eq!(result.cards.len(), 1);
    }

    #[tokio::test]
    async fn test_professor_cap() {
        let fetcher = MapFetcher::new(std::iter::empty::<(&str, &str)>());
        let chat = ScriptedChat::new(vec![]);

        let crawl_limits = CrawlLimits {
            max_professors: 2,
            stub_delay: Duration::from_millis(1),
            ..CrawlLimits::default()
        };
        let stubs = vec![
            stub("Maria Chen", None),
            stub("Tom Okafor", None),
            stub("Priya Natarajan", None),
        ];

        let (result, saved, sink) = run(fetcher, chat, stubs, crawl_limits).await;

        assert_eq!(result.cards.len(), 2);
        assert_eq!(saved.len(), 2);
        let found = sink
            .events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::FoundCard { .. }))
            .count();
        assert_eq!(found, 2);
    }

    #[tokio::test]
    async fn test_illinois_school_heuristic() {
        let fetcher = MapFetcher::new([(
            "https://cs.illinois.edu/people/chen",
            "<p>Maria Chen.</p>",
        )]);
        let chat = ScriptedChat::new(vec![ok(r#"{"professor_name": "Maria Chen"}"#)]);

        let (result, _, _) = run(
            fetcher,
            chat,
            vec![stub("Maria Chen", Some("https://cs.illinois.edu/people/chen"))],
            limits(),
        )
        .await;

        assert_eq!(
            result.cards[0].school.as_deref(),
            Some("University of Illinois Urbana-Champaign")
        );
    }
}
