// Wiki Answer - Core Library
// Free-text question → named entity → knowledge-base lookup → readable summary.
// Shared by the CLI and the web server.

pub mod api;
pub mod config;
pub mod messages;
pub mod labels;         // Label Resolver + bounded cache
pub mod search;         // Entity Search with language fallback
pub mod claims;         // Claim Formatter
pub mod describe;       // Description Composer
pub mod pipeline;       // find_and_describe
pub mod tagger;         // NER seam + heuristic tagger
pub mod answer;         // ask / show more

// Re-export commonly used types
pub use api::{ApiError, Entity, KnowledgeApi, Statement, WikidataClient};
pub use config::{Config, Language};
pub use messages::Messages;
pub use labels::{LabelCache, LabelResolver};
pub use search::{Candidate, EntitySearch};
pub use claims::{format_display, human_date, ClaimError, ClaimFormatter, ClaimValue};
pub use describe::{ComposerSettings, DescriptionComposer, EntityDescription, INTERESTING_PROPERTIES};
pub use pipeline::{FoundEntity, Pipeline};
pub use tagger::{extract_query, EntityTagger, HeuristicTagger, SpanKind, TaggedSpan};
pub use answer::{Answer, AnswerService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the fmt subscriber used by both binaries.
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
