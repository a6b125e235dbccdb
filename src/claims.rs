// 🧾 Claim Formatter - structured claims → human-readable values
//
// Each statement's value is decoded into an explicit ClaimValue variant
// (keyed by the snak's declared datatype) and then rendered. Adding a new
// value kind means adding a variant; render() matches exhaustively.

use crate::api::{Snak, Statement};
use crate::config::Language;
use crate::labels::LabelResolver;
use crate::messages::Messages;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Unit URI the API uses for dimensionless quantities
pub const DIMENSIONLESS_UNIT: &str = "http://www.wikidata.org/entity/Q199";

// ============================================================================
// CLAIM VALUE
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum ClaimError {
    #[error("snak has no datavalue")]
    MissingValue,

    #[error("{datatype} value lacks field {field:?}")]
    BadShape { datatype: String, field: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    /// Reference to another entity (or property) by identifier
    Item(String),

    /// Point in time, API format "+YYYY-MM-DDThh:mm:ssZ"
    Time(String),

    /// Plain string, external identifier, URL or media file name
    Text(String),

    Quantity { amount: String, unit: Option<String> },

    /// Text in a specific language (titles, mottos)
    Monolingual(String),

    Coordinate { latitude: f64, longitude: f64 },

    /// Any kind without a dedicated variant
    Other(Value),
}

impl ClaimValue {
    /// Decode the value slot of a snak.
    ///
    /// `Ok(None)` for "novalue"/"somevalue" snaks; `Err` when the value does
    /// not have the shape its datatype promises.
    pub fn from_snak(snak: &Snak) -> Result<Option<ClaimValue>, ClaimError> {
        if snak.snaktype != "value" {
            return Ok(None);
        }

        let value = &snak.datavalue.as_ref().ok_or(ClaimError::MissingValue)?.value;
        let datatype = snak.datatype.as_str();

        let field = |v: &Value, name: &'static str| -> Result<String, ClaimError> {
            v.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ClaimError::BadShape {
                    datatype: datatype.to_string(),
                    field: name,
                })
        };

        let decoded = match datatype {
            "wikibase-item" | "wikibase-property" => ClaimValue::Item(field(value, "id")?),
            "time" => ClaimValue::Time(field(value, "time")?),
            "string" | "external-id" | "url" | "commonsMedia" => {
                let text = value.as_str().ok_or_else(|| ClaimError::BadShape {
                    datatype: datatype.to_string(),
                    field: "value",
                })?;
                ClaimValue::Text(text.to_string())
            }
            "quantity" => ClaimValue::Quantity {
                amount: field(value, "amount")?,
                unit: value.get("unit").and_then(Value::as_str).map(str::to_string),
            },
            "monolingualtext" => ClaimValue::Monolingual(field(value, "text")?),
            "globe-coordinate" => {
                let coord = |name: &'static str| {
                    value.get(name).and_then(Value::as_f64).ok_or_else(|| {
                        ClaimError::BadShape {
                            datatype: datatype.to_string(),
                            field: name,
                        }
                    })
                };
                ClaimValue::Coordinate {
                    latitude: coord("latitude")?,
                    longitude: coord("longitude")?,
                }
            }
            _ => ClaimValue::Other(value.clone()),
        };

        Ok(Some(decoded))
    }
}

// ============================================================================
// DATES
// ============================================================================

/// "+1835-12-31T00:00:00Z" → "31 декабря 1835 года" (for `Language::Ru`).
///
/// Values not starting with '+' are returned unchanged. If the ten
/// characters after '+' are not a valid date (e.g. year precision
/// "1879-00-00"), those raw characters are returned instead.
pub fn human_date(ts: &str, lang: Language) -> String {
    let Some(rest) = ts.strip_prefix('+') else {
        return ts.to_string();
    };

    let cut = rest.char_indices().nth(10).map_or(rest.len(), |(idx, _)| idx);
    let date = &rest[..cut];
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => Messages::for_language(lang).long_date(d.year(), d.month(), d.day()),
        Err(_) => date.to_string(),
    }
}

// ============================================================================
// FORMATTER
// ============================================================================

pub struct ClaimFormatter {
    labels: Arc<LabelResolver>,
}

impl ClaimFormatter {
    pub fn new(labels: Arc<LabelResolver>) -> Self {
        ClaimFormatter { labels }
    }

    /// Readable values of `property`, de-duplicated, without empty entries.
    ///
    /// Statements that fail to decode are skipped individually.
    pub fn format_values(
        &self,
        claims: &HashMap<String, Vec<Statement>>,
        property: &str,
        lang: Language,
    ) -> Vec<String> {
        let Some(statements) = claims.get(property) else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(statements.len());
        for (idx, statement) in statements.iter().enumerate() {
            match ClaimValue::from_snak(&statement.mainsnak) {
                Ok(Some(value)) => out.push(self.render(&value, lang)),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(property, idx, error = %e, "skipping malformed claim");
                }
            }
        }

        dedupe_non_empty(out)
    }

    pub fn render(&self, value: &ClaimValue, lang: Language) -> String {
        match value {
            ClaimValue::Item(id) => self.labels.resolve(id, lang),
            ClaimValue::Time(ts) => human_date(ts, lang),
            ClaimValue::Text(text) | ClaimValue::Monolingual(text) => text.clone(),
            ClaimValue::Quantity { amount, unit } => {
                let amount = amount.strip_prefix('+').unwrap_or(amount.as_str());
                match unit.as_deref().and_then(unit_id) {
                    Some(unit) => format!("{} {}", amount, self.labels.resolve(unit, lang)),
                    None => amount.to_string(),
                }
            }
            ClaimValue::Coordinate {
                latitude,
                longitude,
            } => format!("{}, {}", latitude, longitude),
            ClaimValue::Other(Value::String(s)) => s.clone(),
            ClaimValue::Other(raw) => raw.to_string(),
        }
    }
}

/// Identifier of a quantity's unit, `None` when the quantity is dimensionless
fn unit_id(unit: &str) -> Option<&str> {
    if unit.is_empty() || unit == "1" || unit == DIMENSIONLESS_UNIT {
        return None;
    }
    unit.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Keep first occurrences in order, drop empty strings
pub fn dedupe_non_empty(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

/// "v1, v2, v3" plus " …" when more than `max_values` values exist
pub fn format_display(values: &[String], max_values: usize) -> String {
    let shown = values.iter().take(max_values).cloned().collect::<Vec<_>>().join(", ");
    if values.len() > max_values {
        format!("{} …", shown)
    } else {
        shown
    }
}

// ============================================================================
// TESTS
// ============================================================================
