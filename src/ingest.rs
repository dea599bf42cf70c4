//! One-shot corpus ingestion.
//!
//! Reads the source manual from disk, splits it into passages, and builds
//! the immutable [`Corpus`] that the rest of the pipeline shares read-only.
//! PDF extraction and chunk persistence are external concerns: the manual
//! arrives here as already-extracted text.
//!
//! Ingestion failure is not fatal. A missing or unreadable manual logs a
//! warning and yields an empty corpus, and the process keeps running in a
//! degraded mode (full-document prompt with empty text).

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::chunk::split_passages;
use crate::config::Config;
use crate::models::Corpus;

/// Build the corpus from the configured manual path.
///
/// Never fails outward: any read or split error degrades to
/// [`Corpus::empty`]. Call once at startup; the result is shared for the
/// process lifetime.
pub fn ingest_corpus(config: &Config) -> Corpus {
    match try_ingest(config) {
        Ok(corpus) => corpus,
        Err(e) => {
            warn!("corpus ingestion failed, continuing with empty corpus: {e:#}");
            Corpus::empty()
        }
    }
}

fn try_ingest(config: &Config) -> Result<Corpus> {
    let path = match &config.corpus.path {
        Some(p) => p,
        None => {
            warn!("no corpus.path configured, starting with empty corpus");
            return Ok(Corpus::empty());
        }
    };

    let full_text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manual: {}", path.display()))?;

    if full_text.trim().is_empty() {
        warn!("manual at {} is empty", path.display());
        return Ok(Corpus::empty());
    }

    let passages = split_passages(&full_text, config.corpus.max_passage_chars);

    info!(
        passages = passages.len(),
        chars = full_text.len(),
        "corpus ingested from {}",
        path.display()
    );

    Ok(Corpus {
        passages,
        full_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_with_manual(content: &str) -> (tempfile::TempDir, Config) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("manuel.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        let mut cfg = Config::minimal();
        cfg.corpus.path = Some(path);
        (dir, cfg)
    }

    #[test]
    fn test_ingest_builds_corpus() {
        let (_dir, cfg) = config_with_manual(
            "CHAPITRE 1 POLITIQUE GESTION RETARDS\n\nRetard mineur: 0 à 15 minutes.\n\nRetard critique: 60 minutes.",
        );
        let corpus = ingest_corpus(&cfg);
        assert!(!corpus.is_empty());
        assert!(corpus.full_text.contains("Retard critique"));
    }

    #[test]
    fn test_missing_path_yields_empty_corpus() {
        let corpus = ingest_corpus(&Config::minimal());
        assert!(corpus.is_empty());
        assert!(corpus.full_text.is_empty());
    }

    #[test]
    fn test_unreadable_file_degrades_to_empty() {
        let mut cfg = Config::minimal();
        cfg.corpus.path = Some("/nonexistent/manuel.txt".into());
        let corpus = ingest_corpus(&cfg);
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_corpus_invariant_full_text_iff_passages() {
        let (_dir, cfg) = config_with_manual("Un seul paragraphe.");
        let corpus = ingest_corpus(&cfg);
        assert_eq!(corpus.passages.is_empty(), corpus.full_text.is_empty());

        let empty = ingest_corpus(&Config::minimal());
        assert_eq!(empty.passages.is_empty(), empty.full_text.is_empty());
    }
}
