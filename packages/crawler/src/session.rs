//! Session orchestrator: runs the two crawl phases for one session and owns
//! its status transitions.
//!
//! Failure policy: everything below this level degrades or skips; only two
//! paths change the outcome. A low discovery yield aborts with status
//! `error` and a remediation hint, and any unexpected failure lands in the
//! catch-all, which marks the session `failed` without ever taking the
//! process down with it.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info};

use crate::config::CrawlLimits;
use crate::discovery::DiscoveryEngine;
use crate::events::{EventSink, ProgressEvent};
use crate::fetcher::PageFetcher;
use crate::filter::CandidateFilter;
use crate::gateway::ExtractionGateway;
use crate::investigation::InvestigationEngine;
use crate::links::LinkClassifier;
use crate::storage::Store;
use crate::types::{ScrapeSession, SessionStatus};

pub struct SessionRunner {
    pub fetcher: Arc<dyn PageFetcher>,
    pub gateway: Arc<ExtractionGateway>,
    pub classifier: LinkClassifier,
    pub limits: CrawlLimits,
    pub store: Arc<dyn Store>,
}

impl SessionRunner {
    /// Run one session to completion. Never returns an error and never
    /// panics the caller's task; failures become session state.
    pub async fn run(&self, session: &ScrapeSession, sink: &dyn EventSink) {
        info!(session_id = %session.id, roots = session.root_urls.len(), "Session starting");

        if let Err(e) = self.execute(session, sink).await {
            error!(session_id = %session.id, error = %e, "Session failed");
            let reason = e.to_string();
            if let Err(e) = self
                .store
                .update_session_status(session.id, SessionStatus::Failed, Some(&reason), None)
                .await
            {
                error!(session_id = %session.id, error = %e, "Could not record failure");
            }
            sink.emit(ProgressEvent::error(reason));
        }
    }

    async fn execute(&self, session: &ScrapeSession, sink: &dyn EventSink) -> Result<()> {
        self.store
            .update_session_status(session.id, SessionStatus::Running, None, None)
            .await?;

        let started = Instant::now();
        let mut filter = CandidateFilter::default();

        let discovery = DiscoveryEngine {
            fetcher: self.fetcher.as_ref(),
            gateway: &self.gateway,
            classifier: &self.classifier,
            limits: &self.limits,
        };
        let mut found = discovery
            .run(
                session,
                &mut filter,
                sink,
                started + self.limits.discovery_budget(),
            )
            .await;

        if found.stubs.len() < self.limits.min_stub_yield {
            let reason = format!(
                "Only found {} potential candidates. Please provide a direct link to the 'Faculty Directory'.",
                found.stubs.len()
            );
            sink.emit(ProgressEvent::Suggestion {
                message: reason.clone(),
            });
            let blocked_url = found.blocked.as_ref().map(|(_, url)| url.as_str());
            self.store
                .update_session_status(
                    session.id,
                    SessionStatus::Error,
                    Some(&reason),
                    blocked_url,
                )
                .await?;
            info!(session_id = %session.id, stubs = found.stubs.len(), "Session aborted: low yield");
            return Ok(());
        }

        let investigation = InvestigationEngine {
            fetcher: self.fetcher.as_ref(),
            gateway: &self.gateway,
            limits: &self.limits,
        };
        let result = investigation
            .run(
                session,
                std::mem::take(&mut found.stubs),
                &mut found.visited,
                self.store.as_ref(),
                sink,
                started + self.limits.timeout,
                found.pages_scanned,
            )
            .await;

        self.store
            .update_session_status(session.id, SessionStatus::Done, None, None)
            .await?;

        let total_cards = result.cards.len();
        sink.emit(ProgressEvent::Complete {
            total_cards,
            pages_crawled: result.pages_scanned,
            message: format!("Investigation complete! Found {total_cards} professors."),
        });

        if total_cards < 5 {
            sink.emit(ProgressEvent::Suggestion {
                message: "Tip: Few results found? Try pasting the exact 'Faculty Directory' URL \
                          (e.g., https://cs.illinois.edu/people/faculty) instead of the home page."
                    .to_string(),
            });
        } else {
            let avg = result
                .cards
                .iter()
                .map(|card| card.match_score)
                .sum::<f32>()
                / total_cards as f32;
            if avg > 0.0 && avg < 40.0 {
                sink.emit(ProgressEvent::Suggestion {
                    message: format!(
                        "Tip: Average Match Score is low ({}%). Try refining your 'Custom Prompt'.",
                        avg as i32
                    ),
                });
            }
        }

        info!(session_id = %session.id, total_cards, "Session done");
        Ok(())
    }
}
