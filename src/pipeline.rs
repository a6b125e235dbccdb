// 🔗 Pipeline - free text → described candidates
// Entity Search → Description Composer, one candidate at a time, in ranking order.

use crate::api::{KnowledgeApi, WikidataClient};
use crate::config::{Config, Language};
use crate::describe::{ComposerSettings, DescriptionComposer};
use crate::labels::LabelResolver;
use crate::search::{Candidate, EntitySearch};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One described search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundEntity {
    pub label: String,
    pub description: String,
    /// Full text block from the composer
    pub text: String,
    pub url: String,
}

pub struct Pipeline {
    search: EntitySearch,
    composer: DescriptionComposer,
    settings: ComposerSettings,
    limit: usize,
}

impl Pipeline {
    /// Pipeline talking to the configured knowledge API
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = WikidataClient::new(config).context("Failed to create HTTP client")?;
        Ok(Pipeline::with_api(Arc::new(client), config))
    }

    pub fn with_api(api: Arc<dyn KnowledgeApi>, config: &Config) -> Self {
        let labels = Arc::new(LabelResolver::new(
            api.clone(),
            config.fallback_language,
            config.label_cache_capacity,
        ));
        let settings = ComposerSettings::from_config(config);

        Pipeline {
            search: EntitySearch::new(api.clone(), config.fallback_language),
            composer: DescriptionComposer::new(api, labels, settings.clone()),
            settings,
            limit: config.search_limit,
        }
    }

    pub fn search(&self, query: &str, lang: Language) -> Vec<Candidate> {
        self.search.search(query, lang, self.limit)
    }

    /// Text block for an already-known identifier
    pub fn describe(&self, id: &str, lang: Language) -> String {
        self.composer.describe(id, lang)
    }

    /// Search, then describe every candidate. Empty when nothing matched.
    pub fn find_and_describe(&self, query: &str, lang: Language) -> Vec<FoundEntity> {
        let candidates = self.search(query, lang);
        if candidates.is_empty() {
            tracing::info!(query, %lang, "no candidates");
            return Vec::new();
        }

        tracing::info!(query, %lang, candidates = candidates.len(), "describing candidates");

        candidates
            .into_iter()
            .map(|c| FoundEntity {
                text: self.composer.describe(&c.id, lang),
                url: self.settings.entity_url(&c.id),
                label: c.label,
                description: c.description,
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
