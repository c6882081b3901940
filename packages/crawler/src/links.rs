//! Heuristic link classifier for discovery navigation.
//!
//! Scores outbound links by keyword tables (see [`crate::config::LinkKeywords`])
//! instead of asking the LLM. Good enough to find the faculty directory
//! from a department home page without spending tokens.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::config::LinkKeywords;

/// A navigable link with its heuristic priority (2 = faculty directory
/// terms, 1 = general academic terms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredLink {
    pub url: String,
    pub priority: u8,
}

pub struct LinkClassifier {
    keywords: LinkKeywords,
}

impl LinkClassifier {
    pub fn new(keywords: LinkKeywords) -> Self {
        Self { keywords }
    }

    /// Classify every anchor on a page against the keyword tables.
    ///
    /// Output is deduplicated by URL and sorted by descending priority;
    /// within one priority the page order is preserved. Links with no
    /// keyword hit, a blocked keyword in `href + " " + text`, a blocked
    /// file extension, or an off-domain target are discarded.
    ///
    /// The same-domain check is a literal substring match of the base host
    /// against the resolved URL. It over-matches subdomains and that is
    /// accepted.
    pub fn classify_scored(&self, html: &str, base_url: &str) -> Vec<ScoredLink> {
        let base = match Url::parse(base_url) {
            Ok(u) => u,
            Err(_) => return Vec::new(),
        };
        let host = match base.host_str() {
            Some(h) => h.to_string(),
            None => return Vec::new(),
        };
        let anchor_selector = match Selector::parse("a[href]") {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };

        let document = Html::parse_document(html);
        let mut scored: Vec<ScoredLink> = Vec::new();

        for anchor in document.select(&anchor_selector) {
            let href = match anchor.value().attr("href") {
                Some(h) => h,
                None => continue,
            };

            let href_lower = href.to_lowercase();
            let text = anchor.text().collect::<String>().to_lowercase();
            let combined = format!("{} {}", href_lower, text);

            if self
                .keywords
                .blocked_extensions
                .iter()
                .any(|ext| href_lower.ends_with(ext.as_str()))
            {
                continue;
            }

            if self
                .keywords
                .blocked
                .iter()
                .any(|k| combined.contains(k.as_str()))
            {
                continue;
            }

            let priority = if self
                .keywords
                .high_priority
                .iter()
                .any(|k| combined.contains(k.as_str()))
            {
                2
            } else if self
                .keywords
                .medium_priority
                .iter()
                .any(|k| combined.contains(k.as_str()))
            {
                1
            } else {
                continue;
            };

            let resolved = match base.join(href) {
                Ok(u) => u,
                Err(_) => continue,
            };

            if !resolved.as_str().contains(&host) {
                continue;
            }

            scored.push(ScoredLink {
                url: resolved.to_string(),
                priority,
            });
        }

        let mut seen: HashSet<String> = HashSet::new();
        scored.retain(|link| seen.insert(link.url.clone()));
        // Stable: ties keep their page order
        scored.sort_by_key(|link| std::cmp::Reverse(link.priority));
        scored
    }

    /// Classified link URLs, best first.
    pub fn classify(&self, html: &str, base_url: &str) -> Vec<String> {
        self.classify_scored(html, base_url)
            .into_iter()
            .map(|link| link.url)
            .collect()
    }
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new(LinkKeywords::default())
    }
}
