// ⚙️ Configuration - supported languages + runtime settings
// Defaults reproduce the public Wikidata endpoint and the display limits
// of the chat front-end; a JSON file and env vars can override them.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// LANGUAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    Zh,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Ru, Language::En, Language::Zh];

    /// Language code as used by the knowledge API (`uselang`, `languages`)
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Name of the language in that language (for the language picker)
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Ru => "Русский",
            Language::En => "English",
            Language::Zh => "中文",
        }
    }

    /// Pick the best supported language from an `Accept-Language` header.
    ///
    /// Tags are ranked by their `q` weight (default 1.0); ties keep header
    /// order. Region subtags are ignored (`en-GB` counts as `en`).
    pub fn best_match(accept_language: &str) -> Option<Language> {
        let mut best: Option<(Language, f32)> = None;

        for part in accept_language.split(',') {
            let mut pieces = part.trim().split(';');
            let tag = pieces.next().unwrap_or("").trim();
            let primary = tag.split('-').next().unwrap_or("");

            let weight = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            if weight <= 0.0 {
                continue;
            }

            if let Ok(lang) = primary.parse::<Language>() {
                match best {
                    Some((_, w)) if w >= weight => {}
                    _ => best = Some((lang, weight)),
                }
            }
        }

        best.map(|(lang, _)| lang)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            other => bail!("Unsupported language: {:?}", other),
        }
    }
}

// ============================================================================
// CONFIG
// ============================================================================

pub const WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";
pub const WIKIDATA_ENTITY_BASE: &str = "https://www.wikidata.org/entity/";
pub const DEFAULT_USER_AGENT: &str =
    "FreeTextWikidataBot/1.0 (https://example.com; admin@example.com)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Knowledge API endpoint (MediaWiki action API)
    pub api_url: String,

    /// Prefix of an entity's canonical page; the identifier is appended
    pub entity_url_base: String,

    /// Sent on every outbound request
    pub user_agent: String,

    /// Per-call network timeout
    pub timeout_secs: u64,

    /// Candidates requested from the search endpoint
    pub search_limit: usize,

    pub default_language: Language,

    /// Language tried when the requested one yields nothing
    pub fallback_language: Language,

    /// Cap on description lines (header included, source link excluded)
    pub max_lines: usize,

    /// Values shown per property line before truncation
    pub max_values: usize,

    /// Candidates previewed in a multi-result answer
    pub preview_count: usize,

    pub label_cache_capacity: usize,

    /// Web server listen address
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: WIKIDATA_API.to_string(),
            entity_url_base: WIKIDATA_ENTITY_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 8,
            search_limit: 5,
            default_language: Language::Ru,
            fallback_language: Language::En,
            max_lines: 9,
            max_values: 3,
            preview_count: 3,
            label_cache_capacity: 10_000,
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Config {
    /// Load config from JSON file; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Build config from `WIKI_ANSWER_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("WIKI_ANSWER_CONFIG") {
            Ok(path) => Config::from_file(path)?,
            Err(_) => Config::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WIKI_ANSWER_API_URL") {
            self.api_url = url;
        }
        if let Some(addr) = lookup("WIKI_ANSWER_BIND") {
            self.bind_addr = addr;
        }
        if let Some(lang) = lookup("WIKI_ANSWER_LANG") {
            self.default_language = lang.parse().context("Invalid WIKI_ANSWER_LANG")?;
        }
        if let Some(secs) = lookup("WIKI_ANSWER_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .trim()
                .parse()
                .context("Invalid WIKI_ANSWER_TIMEOUT_SECS")?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }
        if self.search_limit == 0 {
            bail!("search_limit must be positive");
        }
        if self.max_lines == 0 || self.max_values == 0 || self.preview_count == 0 {
            bail!("max_lines, max_values and preview_count must be positive");
        }
        if self.label_cache_capacity == 0 {
            bail!("label_cache_capacity must be positive");
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_language_parse() {
        assert_eq!("ru".parse::<Language>().unwrap(), Language::Ru);
        assert_eq!(" EN ".parse::<Language>().unwrap(), Language::En);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_best_match() {
        assert_eq!(Language::best_match("en-US,en;q=0.9"), Some(Language::En));
        assert_eq!(
            Language::best_match("de-DE,ru;q=0.8,en;q=0.5"),
            Some(Language::Ru)
        );
        assert_eq!(
            Language::best_match("en;q=0.3, zh-CN;q=0.7"),
            Some(Language::Zh)
        );
        assert_eq!(Language::best_match("fr, de"), None);
        assert_eq!(Language::best_match("ru;q=0"), None);
        assert_eq!(Language::best_match(""), None);
    }

    #[test]
    fn test_language_serde_lowercase() {
        let json = serde_json::to_string(&Language::Zh).unwrap();
        assert_eq!(json, "\"zh\"");
        let lang: Language = serde_json::from_str("\"ru\"").unwrap();
        assert_eq!(lang, Language::Ru);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 8);
        assert_eq!(config.search_limit, 5);
        assert_eq!(config.fallback_language, Language::En);
        assert_eq!(config.entity_url_base, "https://www.wikidata.org/entity/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"search_limit": 7, "default_language": "en"}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.search_limit, 7);
        assert_eq!(config.default_language, Language::En);
        assert_eq!(config.max_values, 3);
    }

    #[test]
    fn test_config_from_file_rejects_zero_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"search_limit": 0}}"#).unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = Config::from_file("/nonexistent/wiki-answer.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_config_overrides() {
        let vars: HashMap<&str, &str> = [
            ("WIKI_ANSWER_API_URL", "http://localhost:9000/api.php"),
            ("WIKI_ANSWER_LANG", "zh"),
            ("WIKI_ANSWER_TIMEOUT_SECS", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_url, "http://localhost:9000/api.php");
        assert_eq!(config.default_language, Language::Zh);
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.bind_addr, "127.0.0.1:5000");
    }

    #[test]
    fn test_config_override_bad_language() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "WIKI_ANSWER_LANG").then(|| "klingon".to_string())
        });
        assert!(result.is_err());
    }
}
