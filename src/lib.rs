//! # Query Compass
//!
//! A query router and hybrid context-retrieval pipeline for LLM assistants.
//!
//! Query Compass ingests a reference document (an operations manual, for
//! instance), classifies each incoming question by intent, and assembles the
//! most relevant context for a language model: retrieved document passages,
//! live transport records, weather data, or user-supplied CSV content.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌────────────────────────┐
//! │  Corpus  │──▶│   Ingest   │──▶│   Retrieval cascade    │
//! │  (text)  │   │ Chunk+Hash │   │ vector > keyword >     │
//! └──────────┘   └────────────┘   │ heuristic > full-text  │
//!                                 └───────────┬────────────┘
//!                ┌────────────┐               │
//!   question ──▶│ Classifier │───────────────┤
//!                └────────────┘               ▼
//!                 csv/transport/        ┌──────────┐   ┌──────────┐
//!                 weather/document      │  Agent   │──▶│  Model   │
//!                                       └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! qc stats                      # corpus summary and prompt mode
//! qc ask "Quel est le retard du train TGV123 ?"
//! qc inspect "retard"           # retrieval diagnostics
//! qc serve                      # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunk`] | Text chunking |
//! | [`ingest`] | Corpus loading |
//! | [`classify`] | Query intent classification |
//! | [`expand`] | Query variation expansion |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Similarity search |
//! | [`retrieve`] | The retrieval cascade |
//! | [`assemble`] | Context formatting |
//! | [`prompt`] | Prompt construction and mode selection |
//! | [`completion`] | Chat-completion providers |
//! | [`transport`] | Transport records (SQLite) |
//! | [`weather`] | Weather API client |
//! | [`csvdata`] | CSV preprocessing |
//! | [`agent`] | Intent routing and answer generation |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |

pub mod agent;
pub mod assemble;
pub mod chunk;
pub mod classify;
pub mod completion;
pub mod config;
pub mod csvdata;
pub mod db;
pub mod embedding;
pub mod expand;
pub mod index;
pub mod ingest;
pub mod models;
pub mod prompt;
pub mod retrieve;
pub mod server;
pub mod transport;
pub mod weather;
