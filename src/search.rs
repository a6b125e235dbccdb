// 🔎 Entity Search - free text → ranked candidates
// Order is the API's relevance ranking, never re-ranked here.

use crate::api::KnowledgeApi;
use crate::config::Language;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_LIMIT: usize = 5;

/// A search hit considered as a possible answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,

    #[serde(default)]
    pub label: String,

    /// Short description from the search endpoint (may be empty)
    #[serde(default)]
    pub description: String,
}

pub struct EntitySearch {
    api: Arc<dyn KnowledgeApi>,
    fallback: Language,
}

impl EntitySearch {
    pub fn new(api: Arc<dyn KnowledgeApi>, fallback: Language) -> Self {
        EntitySearch { api, fallback }
    }

    /// Candidates for `query` in `lang`.
    ///
    /// An empty primary result triggers exactly one retry in the fallback
    /// language. A failed call counts as an empty result.
    pub fn search(&self, query: &str, lang: Language, limit: usize) -> Vec<Candidate> {
        let hits = self.search_once(query, lang, limit);
        if !hits.is_empty() || lang == self.fallback {
            return hits;
        }

        tracing::debug!(query, from = %lang, to = %self.fallback, "no hits, retrying in fallback language");
        self.search_once(query, self.fallback, limit)
    }

    fn search_once(&self, query: &str, lang: Language, limit: usize) -> Vec<Candidate> {
        match self.api.search(query, lang, limit) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(query, %lang, error = %e, "entity search failed");
                Vec::new()
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{candidate, MockApi};

    fn search(api: MockApi) -> (Arc<MockApi>, EntitySearch) {
        let api = Arc::new(api);
        (api.clone(), EntitySearch::new(api, Language::En))
    }

    #[test]
    fn test_primary_hit_no_retry() {
        let api = MockApi::new().with_search(
            "Эйнштейн",
            Language::Ru,
            vec![candidate("Q937", "Альберт Эйнштейн", "физик")],
        );
        let (api, search) = search(api);

        let hits = search.search("Эйнштейн", Language::Ru, DEFAULT_LIMIT);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "Q937");
        assert_eq!(api.calls(), vec!["search:ru:Эйнштейн"]);
    }

    #[test]
    fn test_fallback_retry_exactly_once() {
        let api = MockApi::new().with_search(
            "Einstein",
            Language::En,
            vec![candidate("Q937", "Albert Einstein", "physicist")],
        );
        let (api, search) = search(api);

        let hits = search.search("Einstein", Language::Ru, DEFAULT_LIMIT);
        assert_eq!(hits[0].label, "Albert Einstein");
        assert_eq!(api.calls(), vec!["search:ru:Einstein", "search:en:Einstein"]);
    }

    #[test]
    fn test_no_results_anywhere() {
        let (api, search) = search(MockApi::new());

        assert!(search.search("xyzzy", Language::Zh, DEFAULT_LIMIT).is_empty());
        assert_eq!(api.count("search:"), 2);
    }

    #[test]
    fn test_fallback_language_not_retried() {
        let (api, search) = search(MockApi::new());

        assert!(search.search("xyzzy", Language::En, DEFAULT_LIMIT).is_empty());
        assert_eq!(api.count("search:"), 1);
    }

    #[test]
    fn test_failure_counts_as_empty() {
        let mut api = MockApi::new();
        api.fail_search = true;
        let (api, search) = search(api);

        assert!(search.search("Einstein", Language::Ru, DEFAULT_LIMIT).is_empty());
        assert_eq!(api.count("search:"), 2);
    }

    #[test]
    fn test_order_and_limit_preserved() {
        let hits: Vec<Candidate> = (1..=7)
            .map(|i| candidate(&format!("Q{}", i), &format!("Mercury {}", i), ""))
            .collect();
        let api = MockApi::new().with_search("Mercury", Language::En, hits);
        let (_, search) = search(api);

        let found = search.search("Mercury", Language::En, 5);
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Q1", "Q2", "Q3", "Q4", "Q5"]);
    }
}
