// 🏷️ Entity Tagger - question text → named-entity spans
//
// The tagger is a seam: a real NER model plugs in through `EntityTagger`.
// `HeuristicTagger` is the built-in fallback: capitalized word runs, typed by
// simple cues. Caseless scripts produce no spans, so the whole question is
// used as the query.

use crate::config::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Person,
    Organization,
    Location,
    Other,
}

impl SpanKind {
    /// Kinds usable as a search query
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            SpanKind::Person | SpanKind::Organization | SpanKind::Location
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSpan {
    pub text: String,
    pub kind: SpanKind,
}

impl TaggedSpan {
    pub fn new(text: impl Into<String>, kind: SpanKind) -> Self {
        TaggedSpan {
            text: text.into(),
            kind,
        }
    }
}

pub trait EntityTagger: Send + Sync {
    /// Spans in text order
    fn tag(&self, text: &str, lang: Language) -> Vec<TaggedSpan>;
}

/// First span of an accepted kind, else the (trimmed) question itself
pub fn extract_query(tagger: &dyn EntityTagger, question: &str, lang: Language) -> String {
    let question = question.trim();
    tagger
        .tag(question, lang)
        .into_iter()
        .find(|span| span.kind.is_accepted())
        .map(|span| span.text)
        .unwrap_or_else(|| question.to_string())
}

// ============================================================================
// HEURISTIC TAGGER
// ============================================================================

/// Leading words that are capitalized only because they start the sentence
const LEADING_WORDS: &[&str] = &[
    "who", "what", "where", "when", "which", "whose", "why", "how", "is", "are", "was",
    "were", "do", "does", "did", "can", "tell", "show", "find", "please", "i", "the", "a",
    "кто", "что", "где", "когда", "какой", "какая", "какое", "какие", "как", "почему",
    "сколько", "расскажи", "покажи", "найди", "скажи", "я",
];

/// Always capitalized in English, never part of a name
const PRONOUNS: &[&str] = &["i", "i'm", "i've", "i'd", "i'll"];

fn is_pronoun(word: &str) -> bool {
    PRONOUNS.contains(&word.to_lowercase().replace('’', "'").as_str())
}

/// Lowercase words allowed inside a name ("Bank of America", "Leonardo da Vinci")
const CONNECTORS: &[&str] = &["of", "de", "da", "del", "der", "van", "von", "la", "le", "and", "&"];

const ORG_CUES: &[&str] = &[
    "inc", "corp", "corporation", "company", "co", "ltd", "llc", "gmbh", "ag", "plc",
    "university", "institute", "bank", "group", "foundation", "association", "agency",
    "университет", "институт", "компания", "банк", "корпорация", "фонд", "ооо", "пао", "оао",
];

const LOCATIVES: &[&str] = &[
    "in", "at", "from", "to", "near", "into", "в", "во", "из", "на", "под", "около",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTagger;

impl HeuristicTagger {
    pub fn new() -> Self {
        HeuristicTagger
    }
}

struct Token<'a> {
    word: &'a str,
    /// Trailing punctuation closes any run
    closes: bool,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    text.split_whitespace()
        .filter_map(|raw| {
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '&');
            if word.is_empty() {
                return None;
            }
            let closes = raw
                .trim_end()
                .chars()
                .last()
                .map(|c| matches!(c, ',' | '?' | '!' | ';' | ':' | '.'))
                .unwrap_or(false);
            Some(Token { word, closes })
        })
        .collect()
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().map(char::is_uppercase).unwrap_or(false)
}

fn classify(words: &[&str], previous: Option<&str>) -> SpanKind {
    let is_org = words
        .iter()
        .any(|w| ORG_CUES.contains(&w.to_lowercase().trim_end_matches('.')));
    if is_org {
        return SpanKind::Organization;
    }

    if let Some(prev) = previous {
        if LOCATIVES.contains(&prev.to_lowercase().as_str()) {
            return SpanKind::Location;
        }
    }

    SpanKind::Person
}

impl EntityTagger for HeuristicTagger {
    fn tag(&self, text: &str, _lang: Language) -> Vec<TaggedSpan> {
        let tokens = tokenize(text);
        let mut spans = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            let leading = i == 0 && LEADING_WORDS.contains(&token.word.to_lowercase().as_str());

            if leading || is_pronoun(token.word) || !is_capitalized(token.word) {
                i += 1;
                continue;
            }

            let start = i;
            let mut words = vec![token.word];
            let mut end = i + 1;

            if !token.closes {
                while end < tokens.len() {
                    let next = &tokens[end];
                    if is_capitalized(next.word) && !is_pronoun(next.word) {
                        words.push(next.word);
                        end += 1;
                        if next.closes {
                            break;
                        }
                        continue;
                    }

                    // connector only counts when a capitalized word follows it
                    let joins = CONNECTORS.contains(&next.word)
                        && !next.closes
                        && tokens
                            .get(end + 1)
                            .map(|t| is_capitalized(t.word))
                            .unwrap_or(false);
                    if !joins {
                        break;
                    }
                    words.push(next.word);
                    end += 1;
                }
            }

            let previous = start.checked_sub(1).map(|p| tokens[p].word);
            spans.push(TaggedSpan::new(words.join(" "), classify(&words, previous)));
            i = end;
        }

        spans
    }
}

// ============================================================================
// TESTS
// ============================================================================
