//! Crawl limits and keyword tables.
//!
//! The keyword lists are data, not control flow: they can be swapped or
//! extended without touching the classifier or the candidate filter.

use std::time::Duration;

/// Hard limits for one session run.
#[derive(Debug, Clone)]
pub struct CrawlLimits {
    /// Cards investigated per session
    pub max_professors: usize,
    /// Discovery pages scanned before giving up (fail-fast shallow crawl)
    pub max_pages_fail_fast: usize,
    /// Wall-clock budget for the whole session, measured from session start.
    /// Discovery gets the first half.
    pub timeout: Duration,
    /// Minimum discovery stubs required to proceed to investigation
    pub min_stub_yield: usize,
    /// Directory links enqueued per depth-0 page
    pub max_nav_links: usize,
    /// Pause between investigated stubs (provider rate-limit pressure)
    pub stub_delay: Duration,
    /// Page text handed to discovery extraction, in bytes
    pub discovery_text_limit: usize,
    /// Page text handed to profile extraction, in bytes
    pub profile_text_limit: usize,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_professors: 15,
            max_pages_fail_fast: 5,
            timeout: Duration::from_secs(180),
            min_stub_yield: 3,
            max_nav_links: 8,
            stub_delay: Duration::from_millis(500),
            discovery_text_limit: 15_000,
            profile_text_limit: 6_000,
        }
    }
}

impl CrawlLimits {
    /// Discovery stops early once this many stubs have been collected.
    pub fn max_stubs(&self) -> usize {
        self.max_professors * 2
    }

    /// Discovery gets the first half of the session budget.
    pub fn discovery_budget(&self) -> Duration {
        self.timeout / 2
    }
}

/// Models tried by the extraction gateway, in priority order.
pub fn default_models() -> Vec<String> {
    vec![
        "llama-3.3-70b-versatile".to_string(),
        "meta-llama/llama-4-maverick-17b-128e-instruct".to_string(),
    ]
}

/// Keyword tables driving the link classifier.
#[derive(Debug, Clone)]
pub struct LinkKeywords {
    /// Faculty-directory terms → priority 2
    pub high_priority: Vec<String>,
    /// General academic-page terms → priority 1
    pub medium_priority: Vec<String>,
    /// Never follow a link whose href+text contains one of these
    pub blocked: Vec<String>,
    /// Never follow a link to a non-HTML document
    pub blocked_extensions: Vec<String>,
}

impl Default for LinkKeywords {
    fn default() -> Self {
        Self {
            high_priority: to_strings(&[
                "faculty",
                "people",
                "directory",
                "professors",
                "researchers",
                "labs",
                "research-groups",
                "academic-staff",
            ]),
            medium_priority: to_strings(&[
                "department",
                "about",
                "team",
                "members",
                "profiles",
                "academic",
            ]),
            blocked: to_strings(&[
                "history",
                "alumni",
                "news",
                "events",
                "calendar",
                "nobel",
                "laureate",
                "pulitzer",
                "awards",
                "obituary",
                "memoriam",
                "deceased",
                "emeritus",
                "retired",
                "staff",
                "admin",
                "counseling",
                "hr",
                "human-resources",
                "services",
                "well-being",
                "assistance",
                "finance",
                "jobs",
                "careers",
                "transcript",
                "registrar",
                "advising",
                "undergraduate",
                "accessibility",
                "login",
                "apply",
                "catalog",
                "archive",
                "handbook",
                "policy",
                "policies",
                "leadership",
                "chancellor",
                "provost",
                "dean",
                "president",
                "executive",
                "board-of",
                "trustees",
                "governance",
                "strategic",
                "mission",
                "vision",
            ]),
            blocked_extensions: to_strings(&[
                ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".jpg", ".jpeg",
                ".png", ".gif", ".svg", ".zip", ".tar", ".gz",
            ]),
        }
    }
}

/// Blocklists driving the candidate filter.
#[derive(Debug, Clone)]
pub struct FilterLists {
    /// Known placeholder names the LLM invents for templates
    pub placeholder_names: Vec<String>,
    /// Exact-match terms that are clearly not people
    pub non_person_terms: Vec<String>,
    /// Substring terms marking organizations and places
    pub organization_keywords: Vec<String>,
    /// Substring terms marking administrative titles (matched against the title)
    pub admin_titles: Vec<String>,
}

impl Default for FilterLists {
    fn default() -> Self {
        Self {
            placeholder_names: to_strings(&[
                "john smith",
                "jane doe",
                "john doe",
                "jane smith",
                "john t. smith",
                "jane m. doe",
                "jane a. smith",
                "test user",
                "sample professor",
            ]),
            non_person_terms: to_strings(&[
                "digital",
                "agriculture",
                "tinnitus",
                "communications",
                "network",
                "committee",
                "research",
                "innovation",
                "advisory",
                "oversight",
                "bic",
                "bil",
                "bcnn",
                "roi",
                "ceo",
                "cto",
                "cfo",
                "vp",
                "group",
                "team",
                "staff",
                "faculty",
                "personnel",
            ]),
            organization_keywords: to_strings(&[
                "lab",
                "center",
                "institute",
                "university",
                "department",
                "school",
                "program",
                "office",
                "facility",
                "college",
                "services",
                "administration",
                "bureau",
                "reach",
                "alliance",
                "consortium",
                "initiative",
                "committee",
                "board",
                "council",
                "foundation",
                "society",
                "network",
                "group",
            ]),
            admin_titles: to_strings(&[
                "vice chancellor",
                "chancellor",
                "provost",
                "president",
                "vice president",
                "dean",
                "associate dean",
                "vice dean",
                "assistant dean",
                "director",
                "executive director",
                "assistant director",
                "associate director",
                "coordinator",
                "manager",
                "administrator",
                "specialist",
                "analyst",
                "counselor",
                "advisor",
                "secretary",
                "assistant to",
            ]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = CrawlLimits::default();
        assert_eq!(limits.max_stubs(), 30);
        assert_eq!(limits.discovery_budget(), Duration::from_secs(90));
    }

    #[test]
    fn test_keyword_tables_nonempty() {
        let keywords = LinkKeywords::default();
        assert!(keywords.blocked.len() >= 30);
        assert!(keywords.high_priority.contains(&"faculty".to_string()));

        let lists = FilterLists::default();
        assert!(lists.placeholder_names.contains(&"jane smith".to_string()));
        assert!(lists.admin_titles.contains(&"vice chancellor".to_string()));
    }
}
