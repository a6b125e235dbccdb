// 🏷️ Label Resolver - identifier → display name, memoized
//
// Labels of identifiers are effectively static within a session, so they are
// cached for the process lifetime. The cache has a capacity contract: once
// full, the oldest entry is evicted (insertion order).

use crate::api::{language_chain, ApiError, KnowledgeApi};
use crate::config::Language;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

// ============================================================================
// LABEL CACHE
// ============================================================================

/// Bounded (language, identifier) → label map with FIFO eviction
pub struct LabelCache {
    entries: RwLock<IndexMap<(Language, String), String>>,
    capacity: usize,
}

impl LabelCache {
    pub fn new(capacity: usize) -> Self {
        LabelCache {
            entries: RwLock::new(IndexMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, lang: Language, id: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&(lang, id.to_string())).cloned()
    }

    pub fn insert(&self, lang: Language, id: &str, label: String) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let key = (lang, id.to_string());

        // Same key resolves to the same value; keep its original slot
        if entries.contains_key(&key) {
            entries.insert(key, label);
            return;
        }

        while entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(key, label);
    }

    pub fn contains(&self, lang: Language, id: &str) -> bool {
        self.get(lang, id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ============================================================================
// LABEL RESOLVER
// ============================================================================

pub struct LabelResolver {
    api: Arc<dyn KnowledgeApi>,
    cache: LabelCache,
    fallback: Language,
}

impl LabelResolver {
    pub fn new(api: Arc<dyn KnowledgeApi>, fallback: Language, capacity: usize) -> Self {
        LabelResolver {
            api,
            cache: LabelCache::new(capacity),
            fallback,
        }
    }

    /// Display label of `id` in `lang` (then the fallback language).
    ///
    /// Never fails: if the lookup errors, the identifier itself is returned
    /// and nothing is cached, so a later call can still succeed.
    pub fn resolve(&self, id: &str, lang: Language) -> String {
        if let Some(label) = self.cache.get(lang, id) {
            return label;
        }

        match self.lookup(id, lang) {
            Ok(label) => {
                let label = label.unwrap_or_else(|| id.to_string());
                self.cache.insert(lang, id, label.clone());
                label
            }
            Err(e) => {
                tracing::warn!(id, %lang, error = %e, "label lookup failed, using identifier");
                id.to_string()
            }
        }
    }

    fn lookup(&self, id: &str, lang: Language) -> Result<Option<String>, ApiError> {
        tracing::debug!(id, %lang, "label cache miss");
        let languages = language_chain(lang, self.fallback);
        let entities = self.api.labels(&[id.to_string()], &languages)?;

        Ok(entities
            .get(id)
            .and_then(|e| e.label_in(&languages))
            .map(str::to_string))
    }

    /// Warm the cache for `ids` with batched lookups.
    ///
    /// Identifiers already cached are skipped. Failures are logged and
    /// ignored; `resolve` will retry them one by one.
    pub fn prefetch(&self, ids: &[String], lang: Language) {
        let mut missing: Vec<String> = Vec::new();
        for id in ids {
            if !self.cache.contains(lang, id) && !missing.contains(id) {
                missing.push(id.clone());
            }
        }
        if missing.is_empty() {
            return;
        }

        let languages = language_chain(lang, self.fallback);
        match self.api.labels(&missing, &languages) {
            Ok(entities) => {
                for id in &missing {
                    let label = entities
                        .get(id)
                        .and_then(|e| e.label_in(&languages))
                        .unwrap_or(id.as_str());
                    self.cache.insert(lang, id, label.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(ids = missing.len(), error = %e, "label prefetch failed");
            }
        }
    }

    pub fn cache(&self) -> &LabelCache {
        &self.cache
    }
}

// ============================================================================
// TESTS
// ============================================================================
