//! Candidate filter: keeps LLM-discovered names that plausibly belong to
//! real, active research faculty.
//!
//! Order matters: the title check uses the title the candidate carried at
//! discovery time, not anything fetched later, and the duplicate check runs
//! last so a rejected name never poisons the seen-set.

use std::collections::HashSet;

use crate::config::FilterLists;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooFewTokens,
    PlaceholderName,
    NonPersonTerm,
    OrganizationName,
    AdministrativeTitle,
    Duplicate,
}

/// Stateful per-session-run filter. Owns the seen-name set, so a second
/// directory page cannot re-admit a professor found on the first.
pub struct CandidateFilter {
    lists: FilterLists,
    seen: HashSet<String>,
}

impl CandidateFilter {
    pub fn new(lists: FilterLists) -> Self {
        Self {
            lists,
            seen: HashSet::new(),
        }
    }

    /// Validate a discovered (name, title) pair. Admitted names are recorded
    /// and will reject their case-insensitive duplicates.
    pub fn admit(&mut self, name: &str, title: &str) -> Result<(), Rejection> {
        let name = name.trim();
        let name_lower = name.to_lowercase();
        let title_lower = title.trim().to_lowercase();

        if name.is_empty() || name_lower == "unknown" {
            return Err(Rejection::Empty);
        }

        if name.split_whitespace().count() < 2 {
            return Err(Rejection::TooFewTokens);
        }

        if self.lists.placeholder_names.iter().any(|p| *p == name_lower) {
            return Err(Rejection::PlaceholderName);
        }

        if self.lists.non_person_terms.iter().any(|t| *t == name_lower) {
            return Err(Rejection::NonPersonTerm);
        }

        if self
            .lists
            .organization_keywords
            .iter()
            .any(|k| name_lower.contains(k.as_str()))
        {
            return Err(Rejection::OrganizationName);
        }

        if self
            .lists
            .admin_titles
            .iter()
            .any(|t| title_lower.contains(t.as_str()))
        {
            return Err(Rejection::AdministrativeTitle);
        }

        if !self.seen.insert(name_lower) {
            return Err(Rejection::Duplicate);
        }

        Ok(())
    }

    /// Number of distinct names admitted so far.
    pub fn admitted(&self) -> usize {
        self.seen.len()
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(FilterLists::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plausible_names() {
        let mut filter = CandidateFilter::default();
        assert_eq!(filter.admit("Maria Chen", "Assistant Professor"), Ok(()));
        assert_eq!(filter.admit("Tomás Okafor-Reyes", "Professor"), Ok(()));
        assert_eq!(filter.admitted(), 2);
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        let mut filter = CandidateFilter::default();
        assert_eq!(filter.admit("", "Professor"), Err(Rejection::Empty));
        assert_eq!(filter.admit("  ", "Professor"), Err(Rejection::Empty));
        assert_eq!(filter.admit("Unknown", "Professor"), Err(Rejection::Empty));
    }

    #[test]
    fn test_rejects_single_token() {
        let mut filter = CandidateFilter::default();
        assert_eq!(filter.admit("Aristotle", ""), Err(Rejection::TooFewTokens));
    }

    #[test]
    fn test_rejects_placeholder_names() {
        let mut filter = CandidateFilter::default();
        assert_eq!(
            filter.admit("Jane Smith", "Associate Professor"),
            Err(Rejection::PlaceholderName)
        );
        assert_eq!(
            filter.admit("JOHN DOE", "Professor"),
            Err(Rejection::PlaceholderName)
        );
        // Middle-initial variants are listed too
        assert_eq!(
            filter.admit("Jane A. Smith", "Associate Professor"),
            Err(Rejection::PlaceholderName)
        );
        // The match is exact, so a real name sharing a surname still passes
        assert_eq!(filter.admit("Jane Smithson", "Professor"), Ok(()));
    }

    #[test]
    fn test_non_person_terms_are_exact_match() {
        let mut filter = CandidateFilter::default();
        // Single-token hallucinations hit the token gate first
        assert_eq!(filter.admit("Research", ""), Err(Rejection::TooFewTokens));
        // "Research Committee" falls to the organization substring check
        assert_eq!(
            filter.admit("Research Committee", ""),
            Err(Rejection::OrganizationName)
        );
    }

    #[test]
    fn test_rejects_organizations() {
        let mut filter = CandidateFilter::default();
        assert_eq!(
            filter.admit("Vision Lab", ""),
            Err(Rejection::OrganizationName)
        );
        assert_eq!(
            filter.admit("Beckman Institute", ""),
            Err(Rejection::OrganizationName)
        );
    }

    #[test]
    fn test_rejects_admin_titles() {
        let mut filter = CandidateFilter::default();
        assert_eq!(
            filter.admit("Pat Morgan", "Vice Chancellor for Research"),
            Err(Rejection::AdministrativeTitle)
        );
        assert_eq!(
            filter.admit("Sam Lee", "Associate Dean"),
            Err(Rejection::AdministrativeTitle)
        );
        // The discovery-time title is what counts
        assert_eq!(filter.admit("Sam Lee", "Professor"), Ok(()));
    }

    #[test]
    fn test_rejects_case_insensitive_duplicates() {
        let mut filter = CandidateFilter::default();
        assert_eq!(filter.admit("Maria Chen", "Professor"), Ok(()));
        assert_eq!(
            filter.admit("MARIA CHEN", "Professor"),
            Err(Rejection::Duplicate)
        );
        assert_eq!(filter.admitted(), 1);
    }

    #[test]
    fn test_rejection_does_not_poison_seen_set() {
        let mut filter = CandidateFilter::default();
        assert_eq!(
            filter.admit("Sam Lee", "Executive Director"),
            Err(Rejection::AdministrativeTitle)
        );
        // Same name with an academic title is still admissible
        assert_eq!(filter.admit("Sam Lee", "Assistant Professor"), Ok(()));
    }
}
