use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wiki_answer::{init_tracing, AnswerService, Config, Language};

#[derive(Parser)]
#[command(name = "wiki-answer", version, about = "Answer free-text questions from Wikidata")]
struct Cli {
    /// JSON config file (defaults + WIKI_ANSWER_* env vars otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer language: ru, en or zh (default from config)
    #[arg(long, global = true)]
    lang: Option<Language>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question; several hits are previewed
    Ask { question: Vec<String> },

    /// Full descriptions of every hit for a question
    More { question: Vec<String> },

    /// Describe a known entity identifier (e.g. Q937)
    Describe { id: String },

    /// List search candidates without describing them
    Search { query: Vec<String> },
}

fn main() -> Result<()> {
    init_tracing("wiki_answer=warn");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    let lang = cli.lang.unwrap_or(config.default_language);
    let service = AnswerService::from_config(&config)?;

    match cli.command {
        Command::Ask { question } => {
            let answer = service.ask(&question.join(" "), lang);
            println!("{}", answer.answer);
            if answer.more {
                println!("\n(wiki-answer more {})", question.join(" "));
            }
        }
        Command::More { question } => {
            println!("{}", service.more(&question.join(" "), lang).answer);
        }
        Command::Describe { id } => {
            println!("{}", service.pipeline().describe(id.trim(), lang));
        }
        Command::Search { query } => {
            let candidates = service.pipeline().search(&query.join(" "), lang);
            if candidates.is_empty() {
                eprintln!("No candidates");
                std::process::exit(1);
            }
            for c in candidates {
                if c.description.is_empty() {
                    println!("{}\t{}", c.id, c.label);
                } else {
                    println!("{}\t{} — {}", c.id, c.label, c.description);
                }
            }
        }
    }

    Ok(())
}
