// 💬 Answer Service - the conversational layer over the pipeline
//
// ask():  one hit → its full text; several → short preview of the first few
//         plus a "show more" hint.
// more(): every hit with its full text.

use crate::config::{Config, Language};
use crate::messages::Messages;
use crate::pipeline::{FoundEntity, Pipeline};
use crate::tagger::{extract_query, EntityTagger, HeuristicTagger};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,

    /// More candidates exist than the preview showed
    pub more: bool,

    /// Original question, echoed so the client can ask for more
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// Localized caption for the "show more" control, set only with `more`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_label: Option<String>,
}

impl Answer {
    fn text(answer: impl Into<String>) -> Self {
        Answer {
            answer: answer.into(),
            more: false,
            question: None,
            more_label: None,
        }
    }
}

pub struct AnswerService {
    pipeline: Pipeline,
    tagger: Box<dyn EntityTagger>,
    preview_count: usize,
}

impl AnswerService {
    pub fn new(pipeline: Pipeline, tagger: Box<dyn EntityTagger>, preview_count: usize) -> Self {
        AnswerService {
            pipeline,
            tagger,
            preview_count: preview_count.max(1),
        }
    }

    /// Live service: Wikidata client + heuristic tagger
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(AnswerService::new(
            Pipeline::from_config(config)?,
            Box::new(HeuristicTagger::new()),
            config.preview_count,
        ))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Search query for a question (first named entity, else the question)
    pub fn extract_query(&self, question: &str, lang: Language) -> String {
        extract_query(self.tagger.as_ref(), question, lang)
    }

    pub fn ask(&self, question: &str, lang: Language) -> Answer {
        let msgs = Messages::for_language(lang);
        let question = question.trim();
        if question.is_empty() {
            return Answer::text(msgs.empty_question);
        }

        let found = self.lookup(question, lang);
        if found.is_empty() {
            return Answer::text(msgs.nothing_found);
        }

        if found.len() == 1 {
            return Answer {
                answer: found[0].text.clone(),
                more: false,
                question: Some(question.to_string()),
                more_label: None,
            };
        }

        let (shown, rest) = found.split_at(found.len().min(self.preview_count));

        let mut lines = vec![msgs.several_found.to_string()];
        for f in shown {
            lines.push(format!(
                "• **{}** — {}\n{}",
                f.label,
                f.description,
                msgs.source_link(&f.url)
            ));
        }
        if !rest.is_empty() {
            lines.push(msgs.and_more(rest.len()));
        }

        let more = !rest.is_empty();
        Answer {
            answer: lines.join("\n"),
            more,
            question: Some(question.to_string()),
            more_label: more.then(|| msgs.show_more.to_string()),
        }
    }

    /// Every candidate with its full description
    pub fn more(&self, question: &str, lang: Language) -> Answer {
        let msgs = Messages::for_language(lang);
        let question = question.trim();
        if question.is_empty() {
            return Answer::text(msgs.empty_question);
        }

        let found = self.lookup(question, lang);
        if found.is_empty() {
            return Answer::text(msgs.nothing_found);
        }

        let blocks: Vec<String> = found
            .iter()
            .map(|f| format!("• **{}** — {}\n{}", f.label, f.description, f.text))
            .collect();

        Answer {
            answer: blocks.join("\n\n"),
            more: false,
            question: Some(question.to_string()),
            more_label: None,
        }
    }

    fn lookup(&self, question: &str, lang: Language) -> Vec<FoundEntity> {
        let query = self.extract_query(question, lang);
        tracing::debug!(question, query = %query, "extracted query");
        self.pipeline.find_and_describe(&query, lang)
    }
}

// ============================================================================
// TESTS
// ============================================================================
