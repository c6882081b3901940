//! Phase one: breadth-first scan of seed pages for professor stubs.
//!
//! The crawl is deliberately shallow. Seeds are depth 0; only links
//! harvested from a seed (depth 1) are ever followed, at most five pages
//! are scanned, and the whole phase stops at its wall-clock deadline or at
//! the stub cap. A low yield is the session's problem, not this module's.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlLimits;
use crate::events::{CrawlPhase, EventSink, ProgressEvent};
use crate::fetcher::{FetchError, PageFetcher};
use crate::filter::CandidateFilter;
use crate::gateway::{DirectoryCandidate, DiscoveryOutcome, ExtractionGateway};
use crate::links::LinkClassifier;
use crate::text;
use crate::types::{CrawlQueueEntry, ProfessorStub, ScrapeSession};

/// What discovery produced for one session.
#[derive(Debug, Default)]
pub struct DiscoveryRun {
    pub stubs: Vec<ProfessorStub>,
    /// Pages actually fetched and scanned (failed fetches do not count).
    pub pages_scanned: usize,
    /// Every URL touched, handed to investigation so profile pages already
    /// scanned here are not fetched twice.
    pub visited: HashSet<String>,
    /// Last access-blocked page (403/429), reported when the run yields
    /// nothing so the session can explain itself.
    pub blocked: Option<(u16, String)>,
}

pub struct DiscoveryEngine<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub gateway: &'a ExtractionGateway,
    pub classifier: &'a LinkClassifier,
    pub limits: &'a CrawlLimits,
}

impl<'a> DiscoveryEngine<'a> {
    /// Crawl the session's seed URLs until the page cap, the deadline, the
    /// stub cap, or an empty queue.
    pub async fn run(
        &self,
        session: &ScrapeSession,
        filter: &mut CandidateFilter,
        sink: &dyn EventSink,
        deadline: Instant,
    ) -> DiscoveryRun {
        sink.emit(ProgressEvent::Phase {
            phase: CrawlPhase::Discovery,
            message: "Starting intelligent discovery...".to_string(),
        });

        let mut run = DiscoveryRun::default();
        let mut queue: VecDeque<CrawlQueueEntry> = VecDeque::new();
        for url in &session.root_urls {
            run.visited.insert(url.clone());
            queue.push_back(CrawlQueueEntry {
                url: url.clone(),
                depth: 0,
            });
        }

        while let Some(entry) = queue.pop_front() {
            if run.pages_scanned >= self.limits.max_pages_fail_fast {
                debug!(pages = run.pages_scanned, "Discovery page cap reached");
                break;
            }
            if Instant::now() >= deadline {
                info!("Discovery budget exhausted");
                break;
            }
            if entry.depth > 1 {
                continue;
            }

            sink.emit(ProgressEvent::Scanning {
                url: entry.url.clone(),
                depth: entry.depth,
                pages_crawled: run.pages_scanned,
                found: run.stubs.len(),
            });

            let html = match self.fetcher.fetch(&entry.url).await {
                Ok(html) => html,
                Err(FetchError::Blocked { status, url }) => {
                    warn!(status, url = %url, "Page blocked the crawler");
                    sink.emit(ProgressEvent::error(format!("Could not access: {url}")));
                    run.blocked = Some((status, url));
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, url = %entry.url, "Fetch failed");
                    sink.emit(ProgressEvent::error(format!(
                        "Could not access: {}",
                        entry.url
                    )));
                    continue;
                }
            };
            run.pages_scanned += 1;

            let page_text = text::page_text(&html);
            let outcome = self
                .gateway
                .discover(&page_text, &entry.url, session.major.as_deref(), sink)
                .await;

            match outcome {
                Some(DiscoveryOutcome::ProfilePage) => {
                    self.collect_profile_page(
                        session,
                        &entry.url,
                        &page_text,
                        filter,
                        &mut run,
                        sink,
                    )
                    .await;
                }
                Some(DiscoveryOutcome::DirectoryListing(candidates)) => {
                    if !candidates.is_empty() {
                        sink.emit(ProgressEvent::Discovery {
                            count: candidates.len(),
                        });
                    }
                    self.collect_directory(&entry.url, candidates, filter, &mut run, sink);
                }
                None => {}
            }

            // Seeds feed the queue; harvested pages never do.
            if entry.depth == 0 {
                let mut added = 0;
                for link in self
                    .classifier
                    .classify(&html, &entry.url)
                    .into_iter()
                    .take(self.limits.max_nav_links)
                {
                    if run.visited.insert(link.clone()) {
                        queue.push_back(CrawlQueueEntry {
                            url: link,
                            depth: 1,
                        });
                        added += 1;
                    }
                }
                if added > 0 {
                    sink.emit(ProgressEvent::info(format!(
                        "Found {added} faculty directory links to explore"
                    )));
                }
            }

            if run.stubs.len() >= self.limits.max_stubs() {
                debug!(stubs = run.stubs.len(), "Stub cap reached, stopping discovery");
                break;
            }
        }

        info!(
            stubs = run.stubs.len(),
            pages = run.pages_scanned,
            "Discovery finished"
        );
        run
    }

    /// The scanned page was itself a profile: extract it in full now so
    /// investigation can skip the re-fetch.
    async fn collect_profile_page(
        &self,
        session: &ScrapeSession,
        url: &str,
        page_text: &str,
        filter: &mut CandidateFilter,
        run: &mut DiscoveryRun,
        sink: &dyn EventSink,
    ) {
        let context = session.search_context();
        let profile = self
            .gateway
            .extract_profile(page_text, url, "Unknown", context.as_deref(), sink)
            .await;

        let name = match profile.professor_name.as_deref() {
            Some(name) if name != "Unknown" => name.to_string(),
            _ => return,
        };
        if filter
            .admit(&name, profile.title.as_deref().unwrap_or(""))
            .is_err()
        {
            return;
        }

        run.stubs.push(ProfessorStub {
            name,
            profile_url: Some(url.to_string()),
            source_url: url.to_string(),
            title: profile.title.clone(),
            email: profile.email.clone(),
            snippet: None,
            full_data: Some(profile),
        });
    }

    fn collect_directory(
        &self,
        page_url: &str,
        candidates: Vec<DirectoryCandidate>,
        filter: &mut CandidateFilter,
        run: &mut DiscoveryRun,
        sink: &dyn EventSink,
    ) {
        for candidate in candidates {
            if run.stubs.len() >= self.limits.max_stubs() {
                break;
            }
            if let Err(rejection) =
                filter.admit(&candidate.name, candidate.title.as_deref().unwrap_or(""))
            {
                debug!(name = %candidate.name, ?rejection, "Candidate filtered");
                continue;
            }

            // A profile link pointing back at the directory itself carries
            // no new information.
            let profile_url = candidate
                .profile_url
                .as_deref()
                .and_then(|href| resolve(page_url, href))
                .filter(|resolved| resolved != page_url);

            sink.emit(ProgressEvent::info(match &profile_url {
                Some(url) => format!("Found: {} ({url})", candidate.name),
                None => format!("Found: {} (no profile link)", candidate.name),
            }));

            run.stubs.push(ProfessorStub {
                name: candidate.name,
                profile_url,
                source_url: page_url.to_string(),
                title: candidate.title,
                email: candidate.email,
                snippet: candidate.snippet,
                full_data: None,
            });
        }
    }
}

/// Resolve a possibly-relative profile link against the page it came from.
fn resolve(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    Some(base.join(href).ok()?.to_string())
}
