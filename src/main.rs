//! # Query Compass CLI (`qc`)
//!
//! The `qc` binary is the primary interface for Query Compass. It provides
//! commands for asking questions, inspecting retrieval behavior, printing
//! corpus statistics, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! qc --config ./config/qc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qc ask "<query>"` | Classify the question, retrieve context, and answer |
//! | `qc inspect "<query>"` | Print the retrieval diagnostic report |
//! | `qc stats` | Print corpus size, passage count, and prompt mode |
//! | `qc serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Ask about the reference document
//! qc ask "Quelle est la politique de dédommagement ?" --config ./config/qc.toml
//!
//! # See which retrieval strategy answers a query
//! qc inspect "retard important"
//!
//! # Start the HTTP server for the /chat and /csv endpoints
//! qc serve --config ./config/qc.toml
//! ```

mod agent;
mod assemble;
mod chunk;
mod classify;
mod completion;
mod config;
mod csvdata;
mod db;
mod embedding;
mod expand;
mod index;
mod ingest;
mod models;
mod prompt;
mod retrieve;
mod server;
mod transport;
mod weather;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::classify::Classifier;

/// Query Compass CLI — a query router and hybrid context-retrieval pipeline
/// for LLM assistants.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/qc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "qc",
    about = "Query Compass — a query router and hybrid context-retrieval pipeline for LLM assistants",
    version,
    long_about = "Query Compass ingests a reference document, classifies incoming questions by \
    intent (document, transport, weather, CSV), and assembles the most relevant context for a \
    language model through a cascading retrieval strategy (vector, keyword, heuristic, full-text)."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/qc.toml`. When the file does not exist, built-in
    /// defaults are used (no corpus, all providers disabled).
    #[arg(long, global = true, default_value = "./config/qc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ask a question.
    ///
    /// Classifies the question, gathers context (document passages,
    /// transport records, weather data), and prints the model's answer.
    Ask {
        /// The question to answer.
        query: String,
    },

    /// Print the retrieval diagnostic report for a query.
    ///
    /// Shows corpus size, a vector-search probe, a keyword-search probe,
    /// the winning cascade strategy, and a preview of the assembled context.
    Inspect {
        /// The query to diagnose.
        query: String,
    },

    /// Print corpus statistics.
    ///
    /// Shows the corpus size in characters, the passage count, and the
    /// prompt mode that size selects.
    Stats,

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves `GET /chat`, `POST /csv`, and
    /// `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    match cli.command {
        Commands::Ask { query } => {
            let agent = agent::build(&cfg).await;
            let answer = agent.answer(&query).await;
            println!("{}", answer);
        }
        Commands::Inspect { query } => {
            let agent = agent::build(&cfg).await;
            let intent = classify::KeywordClassifier.classify(&query);
            println!("Intent : {}", intent.as_str());
            println!("{}", agent.diagnose(&query).await);
        }
        Commands::Stats => {
            let agent = agent::build(&cfg).await;
            let corpus = agent.corpus();
            println!("Passages   : {}", corpus.passages.len());
            println!("Caractères : {}", corpus.full_text.chars().count());
            println!("Mode       : {}", agent.mode().as_str());
        }
        Commands::Serve => {
            let agent = Arc::new(agent::build(&cfg).await);
            server::run_server(&cfg, agent).await?;
        }
    }

    Ok(())
}
