// 📝 Description Composer - entity identifier → readable text block
//
// Output shape:
//   **Name** — short description.
//   **property:** v1, v2, v3 …      (at most max_lines - 1 of these)
//
//   [🔗 Source](https://www.wikidata.org/entity/Q…)

use crate::api::{is_entity_id, language_chain, Entity, KnowledgeApi};
use crate::claims::{format_display, ClaimFormatter};
use crate::config::{Config, Language};
use crate::labels::LabelResolver;
use crate::messages::Messages;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Properties worth showing, in display order.
///
/// instance of, occupation, born, died, place of birth, citizenship,
/// inception, founded by, headquarters, website, notable work, award,
/// located in, height, image
pub const INTERESTING_PROPERTIES: [&str; 15] = [
    "P31", "P106", "P569", "P570", "P19", "P27", "P571", "P112", "P159", "P856", "P800",
    "P166", "P131", "P2048", "P18",
];

// ============================================================================
// ENTITY DESCRIPTION
// ============================================================================

/// Formatted entity: everything needed to render the text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    pub id: String,
    pub label: String,
    pub description: String,
    /// (property label, display value) in INTERESTING_PROPERTIES order
    pub properties: Vec<(String, String)>,
    pub url: String,
}

impl EntityDescription {
    pub fn header(&self) -> String {
        if self.description.is_empty() {
            format!("**{}**", self.label)
        } else {
            format!("**{}** — {}.", self.label, self.description)
        }
    }

    pub fn render(&self, lang: Language) -> String {
        let mut lines = Vec::with_capacity(self.properties.len() + 2);
        lines.push(self.header());
        for (name, value) in &self.properties {
            lines.push(format!("**{}:** {}", name, value));
        }
        lines.push(format!("\n{}", Messages::for_language(lang).source_link(&self.url)));
        lines.join("\n")
    }
}

// ============================================================================
// COMPOSER
// ============================================================================

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub properties: Vec<String>,
    /// Header plus property lines never exceed this
    pub max_lines: usize,
    pub max_values: usize,
    pub entity_url_base: String,
    pub fallback: Language,
}

impl ComposerSettings {
    pub fn from_config(config: &Config) -> Self {
        ComposerSettings {
            properties: INTERESTING_PROPERTIES.iter().map(|p| p.to_string()).collect(),
            max_lines: config.max_lines,
            max_values: config.max_values,
            entity_url_base: config.entity_url_base.clone(),
            fallback: config.fallback_language,
        }
    }

    pub fn entity_url(&self, id: &str) -> String {
        format!("{}{}", self.entity_url_base, id)
    }
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct DescriptionComposer {
    api: Arc<dyn KnowledgeApi>,
    labels: Arc<LabelResolver>,
    formatter: ClaimFormatter,
    settings: ComposerSettings,
}

impl DescriptionComposer {
    pub fn new(
        api: Arc<dyn KnowledgeApi>,
        labels: Arc<LabelResolver>,
        settings: ComposerSettings,
    ) -> Self {
        DescriptionComposer {
            api,
            formatter: ClaimFormatter::new(labels.clone()),
            labels,
            settings,
        }
    }

    /// Full text block for `id`, or the localized "not found" message
    pub fn describe(&self, id: &str, lang: Language) -> String {
        match self.compose(id, lang) {
            Some(description) => description.render(lang),
            None => Messages::for_language(lang).entity_not_found.to_string(),
        }
    }

    /// Structured description; `None` if the entity is absent or the fetch failed
    pub fn compose(&self, id: &str, lang: Language) -> Option<EntityDescription> {
        if !is_entity_id(id) {
            tracing::info!(id, "not an entity identifier");
            return None;
        }

        let languages = language_chain(lang, self.settings.fallback);

        let entity = match self.api.entity(id, &languages) {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                tracing::info!(id, "entity not found");
                return None;
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "entity fetch failed");
                return None;
            }
        };

        Some(self.build(id, &entity, lang, &languages))
    }

    fn build(
        &self,
        id: &str,
        entity: &Entity,
        lang: Language,
        languages: &[Language],
    ) -> EntityDescription {
        let label = entity.label_in(languages).unwrap_or(id).to_string();
        let description = entity.description_in(languages).unwrap_or("").to_string();

        // one batched call for the property names we are likely to show
        let present: Vec<String> = self
            .settings
            .properties
            .iter()
            .filter(|p| entity.claims.contains_key(p.as_str()))
            .cloned()
            .collect();
        self.labels.prefetch(&present, lang);

        let max_properties = self.settings.max_lines.saturating_sub(1);
        let mut properties = Vec::new();

        for property in &self.settings.properties {
            if properties.len() >= max_properties {
                break;
            }

            let values = self.formatter.format_values(&entity.claims, property, lang);
            if values.is_empty() {
                continue;
            }

            properties.push((
                self.labels.resolve(property, lang),
                format_display(&values, self.settings.max_values),
            ));
        }

        EntityDescription {
            id: id.to_string(),
            label,
            description,
            properties,
            url: self.settings.entity_url(id),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
