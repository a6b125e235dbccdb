// 🌍 Knowledge API - outbound calls to the structured-knowledge service
//
// Three call shapes, all read-only:
// - search entities by free text        (action=wbsearchentities)
// - batch label lookup by identifiers   (action=wbgetentities, props=labels)
// - full entity fetch by identifier     (action=wbgetentities, props=labels|descriptions|claims)
//
// Responses decode leniently: absent fields become empty defaults.

use crate::config::{Config, Language};
use crate::search::Candidate;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Max identifiers per `wbgetentities` call
pub const MAX_IDS_PER_CALL: usize = 50;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LangValue {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub value: String,
}

/// One entity as returned by `wbgetentities`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub id: String,

    #[serde(deserialize_with = "map_or_empty")]
    pub labels: HashMap<String, LangValue>,

    #[serde(deserialize_with = "map_or_empty")]
    pub descriptions: HashMap<String, LangValue>,

    /// Property id → statements, in API order
    #[serde(deserialize_with = "claims_lenient")]
    pub claims: HashMap<String, Vec<Statement>>,

    /// Present (usually as "") when the id does not exist
    pub missing: Option<String>,
}

impl Entity {
    pub fn is_missing(&self) -> bool {
        self.missing.is_some()
    }

    /// First non-empty label among `languages`, in order
    pub fn label_in(&self, languages: &[Language]) -> Option<&str> {
        pick(&self.labels, languages)
    }

    /// First non-empty description among `languages`, in order
    pub fn description_in(&self, languages: &[Language]) -> Option<&str> {
        pick(&self.descriptions, languages)
    }
}

fn pick<'a>(values: &'a HashMap<String, LangValue>, languages: &[Language]) -> Option<&'a str> {
    languages
        .iter()
        .filter_map(|lang| values.get(lang.code()))
        .map(|v| v.value.as_str())
        .find(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Statement {
    pub mainsnak: Snak,
    pub rank: String,
}

/// The property/value slot of a statement
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snak {
    /// "value", "novalue" or "somevalue"
    pub snaktype: String,
    pub property: String,
    /// Declared value kind ("wikibase-item", "time", "quantity", ...)
    pub datatype: String,
    pub datavalue: Option<DataValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataValue {
    pub value: Value,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    search: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntitiesResponse {
    #[serde(deserialize_with = "map_or_empty")]
    entities: HashMap<String, Entity>,
}

/// The API encodes empty maps as `[]`; treat anything but an object as empty.
fn map_or_empty<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => {
            serde_json::from_value(Value::Object(map)).map_err(serde::de::Error::custom)
        }
        _ => Ok(HashMap::new()),
    }
}

/// Statements that don't fit the wire shape are dropped one by one,
/// so a single odd claim never costs the whole entity.
fn claims_lenient<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<Statement>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, Value> = map_or_empty(deserializer)?;

    Ok(raw
        .into_iter()
        .map(|(property, statements)| {
            let decoded = match statements {
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| match serde_json::from_value::<Statement>(item) {
                        Ok(statement) => Some(statement),
                        Err(e) => {
                            tracing::debug!(%property, error = %e, "skipping undecodable statement");
                            None
                        }
                    })
                    .collect(),
                _ => Vec::new(),
            };
            (property, decoded)
        })
        .collect())
}

/// `Q42`, `P31`, `L7`: one prefix letter, then digits
pub fn is_entity_id(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('Q' | 'P' | 'L'))
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_digit())
}

// ============================================================================
// API TRAIT
// ============================================================================

/// KnowledgeApi - the external knowledge base, consumed as a black box
///
/// Implementations block until the call returns or times out.
pub trait KnowledgeApi: Send + Sync {
    /// Ranked candidates for a free-text query
    fn search(&self, query: &str, language: Language, limit: usize)
        -> Result<Vec<Candidate>, ApiError>;

    /// Labels for several identifiers in one call (keyed by identifier)
    fn labels(
        &self,
        ids: &[String],
        languages: &[Language],
    ) -> Result<HashMap<String, Entity>, ApiError>;

    /// Labels, descriptions and claims of one entity; `None` when it doesn't exist
    fn entity(&self, id: &str, languages: &[Language]) -> Result<Option<Entity>, ApiError>;
}

/// `lang|fallback`, without repeating a language
pub fn language_chain(language: Language, fallback: Language) -> Vec<Language> {
    if language == fallback {
        vec![language]
    } else {
        vec![language, fallback]
    }
}

fn join_languages(languages: &[Language]) -> String {
    languages
        .iter()
        .map(|l| l.code())
        .collect::<Vec<_>>()
        .join("|")
}

// ============================================================================
// WIKIDATA CLIENT
// ============================================================================

pub struct WikidataClient {
    client: Client,
    api_url: String,
}

impl WikidataClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(WikidataClient {
            client,
            api_url: config.api_url.clone(),
        })
    }

    fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T, ApiError> {
        let response = self.client.get(&self.api_url).query(params).send()?;
        check_status(response.status())?;
        decode_body(&response.text()?)
    }

    fn get_entities(
        &self,
        ids: &[String],
        languages: &[Language],
        props: &str,
    ) -> Result<HashMap<String, Entity>, ApiError> {
        let response: EntitiesResponse = self.get(&entities_params(ids, languages, props))?;
        Ok(response.entities)
    }
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

/// JSON body → `T`; an `{"error": ...}` body becomes `ApiError::Api`
fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let body: Value = serde_json::from_str(text)?;

    if let Some(error) = body.get("error") {
        return Err(ApiError::Api {
            code: error["code"].as_str().unwrap_or("unknown").to_string(),
            info: error["info"].as_str().unwrap_or("").to_string(),
        });
    }

    Ok(serde_json::from_value(body)?)
}

fn entities_params(ids: &[String], languages: &[Language], props: &str) -> Vec<(&'static str, String)> {
    vec![
        ("action", "wbgetentities".to_string()),
        ("ids", ids.join("|")),
        ("props", props.to_string()),
        ("languages", join_languages(languages)),
        ("format", "json".to_string()),
    ]
}

/// Identifier batches for label lookups, at most `MAX_IDS_PER_CALL` each
fn label_batches(ids: &[String]) -> std::slice::Chunks<'_, String> {
    ids.chunks(MAX_IDS_PER_CALL)
}

impl KnowledgeApi for WikidataClient {
    fn search(
        &self,
        query: &str,
        language: Language,
        limit: usize,
    ) -> Result<Vec<Candidate>, ApiError> {
        tracing::debug!(query, %language, limit, "wbsearchentities");

        let response: SearchResponse = self.get(&[
            ("action", "wbsearchentities".to_string()),
            ("search", query.to_string()),
            ("language", language.code().to_string()),
            ("uselang", language.code().to_string()),
            ("limit", limit.to_string()),
            ("format", "json".to_string()),
        ])?;

        Ok(response.search)
    }

    fn labels(
        &self,
        ids: &[String],
        languages: &[Language],
    ) -> Result<HashMap<String, Entity>, ApiError> {
        let mut found = HashMap::new();
        for chunk in label_batches(ids) {
            tracing::debug!(ids = chunk.len(), "wbgetentities labels");
            found.extend(self.get_entities(chunk, languages, "labels")?);
        }
        Ok(found)
    }

    fn entity(&self, id: &str, languages: &[Language]) -> Result<Option<Entity>, ApiError> {
        if !is_entity_id(id) {
            tracing::debug!(id, "not an entity identifier");
            return Ok(None);
        }

        tracing::debug!(id, "wbgetentities entity");

        let mut entities = self.get_entities(
            &[id.to_string()],
            languages,
            "labels|descriptions|claims",
        )?;

        Ok(entities.remove(id).filter(|e| !e.is_missing()))
    }
}

// ============================================================================
// IN-MEMORY API (tests)
// ============================================================================


// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_decodes_full_payload() {
        let entity: Entity = serde_json::from_value(json!({
            "type": "item",
            "id": "Q937",
            "labels": {
                "en": { "language": "en", "value": "Albert Einstein" },
                "ru": { "language": "ru", "value": "Альберт Эйнштейн" }
            },
            "descriptions": {
                "en": { "language": "en", "value": "German-born theoretical physicist" }
            },
            "claims": {
                "P569": [{
                    "mainsnak": {
                        "snaktype": "value",
                        "property": "P569",
                        "datatype": "time",
                        "datavalue": {
                            "value": { "time": "+1879-03-14T00:00:00Z", "precision": 11 },
                            "type": "time"
                        }
                    },
                    "type": "statement",
                    "rank": "normal"
                }]
            }
        }))
        .unwrap();

        assert!(!entity.is_missing());
        assert_eq!(entity.label_in(&[Language::Ru, Language::En]), Some("Альберт Эйнштейн"));
        assert_eq!(
            entity.description_in(&[Language::Ru, Language::En]),
            Some("German-born theoretical physicist")
        );
        let snak = &entity.claims["P569"][0].mainsnak;
        assert_eq!(snak.datatype, "time");
        assert_eq!(
            snak.datavalue.as_ref().unwrap().value["time"],
            "+1879-03-14T00:00:00Z"
        );
    }

    #[test]
    fn test_entity_empty_maps_as_arrays() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "Q1",
            "labels": [],
            "descriptions": [],
            "claims": []
        }))
        .unwrap();

        assert!(entity.labels.is_empty());
        assert!(entity.claims.is_empty());
        assert_eq!(entity.label_in(&[Language::En]), None);
    }

    #[test]
    fn test_missing_entity_flag() {
        let entity: Entity = serde_json::from_value(json!({ "id": "Q0", "missing": "" })).unwrap();
        assert!(entity.is_missing());
    }

    #[test]
    fn test_empty_label_is_skipped() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "Q5",
            "labels": {
                "ru": { "language": "ru", "value": "" },
                "en": { "language": "en", "value": "human" }
            }
        }))
        .unwrap();

        assert_eq!(entity.label_in(&[Language::Ru, Language::En]), Some("human"));
    }

    #[test]
    fn test_search_response_defaults() {
        let response: SearchResponse = serde_json::from_value(json!({
            "searchinfo": { "search": "Einstein" },
            "search": [
                { "id": "Q937", "label": "Albert Einstein", "description": "physicist" },
                { "id": "Q123" }
            ]
        }))
        .unwrap();

        assert_eq!(response.search.len(), 2);
        assert_eq!(response.search[1].id, "Q123");
        assert_eq!(response.search[1].label, "");
        assert_eq!(response.search[1].description, "");

        let empty: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.search.is_empty());
    }

    #[test]
    fn test_language_chain() {
        assert_eq!(
            language_chain(Language::Ru, Language::En),
            vec![Language::Ru, Language::En]
        );
        assert_eq!(language_chain(Language::En, Language::En), vec![Language::En]);
        assert_eq!(join_languages(&[Language::Zh, Language::En]), "zh|en");
    }

    #[test]
    fn test_client_builds_from_config() {
        let client = WikidataClient::new(&Config::default()).unwrap();
        assert_eq!(client.api_url, "https://www.wikidata.org/w/api.php");
    }

    #[test]
    fn test_bad_statement_skipped_not_entity() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "Q937",
            "claims": {
                "P31": [
                    { "mainsnak": { "snaktype": "value", "property": "P31", "datatype": null } },
                    {
                        "mainsnak": {
                            "snaktype": "value",
                            "property": "P31",
                            "datatype": "wikibase-item",
                            "datavalue": { "value": { "id": "Q5" }, "type": "wikibase-entityid" }
                        },
                        "rank": "normal"
                    }
                ],
                "P18": "not a list"
            }
        }))
        .unwrap();

        assert_eq!(entity.claims["P31"].len(), 1);
        assert_eq!(entity.claims["P31"][0].mainsnak.datatype, "wikibase-item");
        assert!(entity.claims["P18"].is_empty());
    }

    #[test]
    fn test_is_entity_id() {
        assert!(is_entity_id("Q937"));
        assert!(is_entity_id("P31"));
        assert!(is_entity_id("L7"));
        assert!(!is_entity_id("Q1|Q2"));
        assert!(!is_entity_id("Q"));
        assert!(!is_entity_id("q937"));
        assert!(!is_entity_id(""));
        assert!(!is_entity_id("Q12a"));
    }

    #[test]
    fn test_client_rejects_malformed_id_without_request() {
        let config = Config {
            api_url: "http://127.0.0.1:9/w/api.php".to_string(),
            ..Config::default()
        };
        let client = WikidataClient::new(&config).unwrap();

        assert!(client.entity("Q1|Q2", &[Language::En]).unwrap().is_none());
    }

    #[test]
    fn test_decode_body_api_error() {
        let result: Result<SearchResponse, ApiError> = decode_body(
            r#"{"error": {"code": "no-such-entity", "info": "Could not find an entity"}}"#,
        );

        match result {
            Err(ApiError::Api { code, info }) => {
                assert_eq!(code, "no-such-entity");
                assert_eq!(info, "Could not find an entity");
            }
            other => panic!("expected API error, got {:?}", other),
        }

        let result: Result<SearchResponse, ApiError> = decode_body(r#"{"error": {}}"#);
        assert!(matches!(result, Err(ApiError::Api { code, .. }) if code == "unknown"));
    }

    #[test]
    fn test_decode_body_garbage() {
        let result: Result<SearchResponse, ApiError> = decode_body("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(ApiError::Decode(_))));

        let result: Result<EntitiesResponse, ApiError> =
            decode_body(r#"{"entities": {"Q1": {"missing": 5}}}"#);
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_decode_body_valid() {
        let response: EntitiesResponse = decode_body(
            r#"{"entities": {"Q42": {"id": "Q42", "labels": {"en": {"language": "en", "value": "Douglas Adams"}}}}}"#,
        )
        .unwrap();

        assert_eq!(
            response.entities["Q42"].label_in(&[Language::En]),
            Some("Douglas Adams")
        );
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(ApiError::Status(503))
        ));
        assert!(matches!(check_status(StatusCode::NOT_FOUND), Err(ApiError::Status(404))));
    }

    #[test]
    fn test_label_batches_cap_ids_per_call() {
        let ids: Vec<String> = (1..=120).map(|n| format!("Q{}", n)).collect();

        let sizes: Vec<usize> = label_batches(&ids).map(|chunk| chunk.len()).collect();
        assert_eq!(sizes, vec![50, 50, 20]);

        let params: Vec<_> = label_batches(&ids)
            .map(|chunk| entities_params(chunk, &[Language::Ru, Language::En], "labels"))
            .collect();
        let last_ids = &params[2].iter().find(|(k, _)| *k == "ids").unwrap().1;
        assert!(last_ids.starts_with("Q101|Q102|"));
        assert!(last_ids.ends_with("|Q120"));
        assert!(params[0].contains(&("languages", "ru|en".to_string())));
        assert!(params[0].contains(&("props", "labels".to_string())));
    }
}
