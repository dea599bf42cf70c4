//! End-to-end pipeline tests driving the agent and the retrieval cascade
//! with stub collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use query_compass::agent::Agent;
use query_compass::completion::{CompletionProvider, DisabledCompletion};
use query_compass::config::{RetrievalConfig, WeatherConfig};
use query_compass::db;
use query_compass::index::SimilaritySearch;
use query_compass::models::{Corpus, Passage, Strategy};
use query_compass::prompt::PromptMode;
use query_compass::retrieve::Retriever;
use query_compass::transport::{SqliteTransportRepository, TransportRepository};

/// Returns canned hits per search term and records every term it was asked.
struct ScriptedIndex {
    hits: HashMap<String, Vec<Passage>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedIndex {
    fn new(hits: HashMap<String, Vec<Passage>>) -> Self {
        Self {
            hits,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilaritySearch for ScriptedIndex {
    async fn similarity_search(
        &self,
        query: &str,
        _top_k: usize,
        _min_score: f32,
    ) -> Result<Vec<Passage>> {
        self.calls.lock().unwrap().push(query.to_string());
        Ok(self.hits.get(query).cloned().unwrap_or_default())
    }
}

/// Fails every search, like an index whose embedding backend is down.
struct ErroringIndex;

#[async_trait]
impl SimilaritySearch for ErroringIndex {
    async fn similarity_search(
        &self,
        _query: &str,
        _top_k: usize,
        _min_score: f32,
    ) -> Result<Vec<Passage>> {
        bail!("embedding backend unreachable")
    }
}

/// Echoes both prompt halves so tests can assert what the model would see.
struct EchoCompletion;

#[async_trait]
impl CompletionProvider for EchoCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        Ok(format!("SYSTEM>>>{system}\nUSER>>>{user}"))
    }
}

fn manual_corpus() -> Arc<Corpus> {
    let paragraphs = [
        "CHAPITRE 1 POLITIQUE GESTION RETARDS. Un retard mineur couvre 0 à 15 minutes.",
        "Le dédommagement s'applique au-delà de 60 minutes de retard.",
        "CHAPITRE 2 HORAIRES. Les horaires sont publiés chaque trimestre.",
    ];
    Arc::new(Corpus {
        passages: paragraphs
            .iter()
            .enumerate()
            .map(|(i, text)| Passage::new(format!("p{i}"), *text))
            .collect(),
        full_text: paragraphs.join("\n\n"),
    })
}

fn test_weather_config() -> WeatherConfig {
    WeatherConfig {
        api_key_env: "QC_PIPELINE_TEST_NO_SUCH_KEY".to_string(),
        ..WeatherConfig::default()
    }
}

async fn seeded_transports() -> Arc<SqliteTransportRepository> {
    let pool = db::connect_memory().await.unwrap();
    let repo = SqliteTransportRepository::with_pool(pool);
    repo.seed().await.unwrap();
    Arc::new(repo)
}

fn agent_with(
    mode: PromptMode,
    corpus: Arc<Corpus>,
    index: Arc<dyn SimilaritySearch>,
    completion: Box<dyn CompletionProvider>,
    transports: Option<Arc<SqliteTransportRepository>>,
) -> Agent {
    Agent::new(
        mode,
        corpus,
        index,
        completion,
        transports.map(|t| t as Arc<dyn TransportRepository>),
        test_weather_config(),
        RetrievalConfig::default(),
    )
}

#[tokio::test]
async fn vector_hit_on_second_variation_stops_the_cascade() {
    let corpus = manual_corpus();
    let hit = Passage::new("vec-hit", "Section retard mineur.");
    let mut hits = HashMap::new();
    // The original query misses, the first delay variation hits.
    hits.insert("retard mineur 0 à 15 minutes".to_string(), vec![hit]);
    let index = Arc::new(ScriptedIndex::new(hits));

    let retriever = Retriever::new(corpus, index.clone(), RetrievalConfig::default());
    let result = retriever.retrieve("retard").await;

    assert_eq!(result.strategy, Strategy::Vector);
    assert_eq!(result.passages.len(), 1);
    assert_eq!(result.passages[0].id, "vec-hit");
    // Stopped right after the winning variation
    assert_eq!(
        index.calls(),
        vec!["retard", "retard mineur 0 à 15 minutes"]
    );
}

#[tokio::test]
async fn erroring_index_degrades_to_keyword_search() {
    let corpus = manual_corpus();
    let retriever = Retriever::new(corpus, Arc::new(ErroringIndex), RetrievalConfig::default());

    let result = retriever.retrieve("politique des horaires").await;
    assert_eq!(result.strategy, Strategy::Keyword);
    assert!(!result.passages.is_empty());
}

#[tokio::test]
async fn empty_corpus_yields_full_text_fallback() {
    let retriever = Retriever::new(
        Arc::new(Corpus::empty()),
        Arc::new(ErroringIndex),
        RetrievalConfig::default(),
    );

    let result = retriever.retrieve("une question quelconque").await;
    assert_eq!(result.strategy, Strategy::FullText);
    assert_eq!(result.passages.len(), 1);
    assert!(result.passages[0].content.is_empty());
}

#[tokio::test]
async fn document_answer_in_rag_mode_carries_retrieved_context() {
    let agent = agent_with(
        PromptMode::Rag,
        manual_corpus(),
        Arc::new(ErroringIndex),
        Box::new(EchoCompletion),
        None,
    );

    let answer = agent.answer("Quelle est la politique des horaires ?").await;
    assert!(answer.contains("=== INFORMATIONS PERTINENTES DU MANUEL ==="));
    assert!(answer.contains("CONTEXTE DU DOCUMENT :"));
    assert!(answer.contains("QUESTION :\nQuelle est la politique des horaires ?"));
    // Rag system prompt, not the inlined document
    assert!(answer.contains("extraits de documents fournis"));
    assert!(!answer.contains("=== DOCUMENT COMPLET ==="));
}

#[tokio::test]
async fn document_answer_in_full_document_mode_inlines_corpus() {
    let agent = agent_with(
        PromptMode::FullDocument,
        manual_corpus(),
        Arc::new(ErroringIndex),
        Box::new(EchoCompletion),
        None,
    );

    let answer = agent.answer("Quelle est la politique des horaires ?").await;
    assert!(answer.contains("=== DOCUMENT COMPLET ==="));
    assert!(answer.contains("CHAPITRE 2 HORAIRES"));
    // The question rides alone in the user message
    assert!(answer.contains("USER>>>Quelle est la politique des horaires ?"));
    assert!(!answer.contains("CONTEXTE DU DOCUMENT :"));
}

#[tokio::test]
async fn transport_question_injects_live_records() {
    let agent = agent_with(
        PromptMode::FullDocument,
        manual_corpus(),
        Arc::new(ErroringIndex),
        Box::new(EchoCompletion),
        Some(seeded_transports().await),
    );

    let answer = agent.answer("Quel est le retard du train TGV123 ?").await;
    assert!(answer.contains("=== INFORMATIONS TRANSPORT EN TEMPS RÉEL ==="));
    assert!(answer.contains("TGV123"));
    assert!(answer.contains("delay of 15 minutes"));
}

#[tokio::test]
async fn unknown_transport_number_is_reported() {
    let agent = agent_with(
        PromptMode::FullDocument,
        manual_corpus(),
        Arc::new(ErroringIndex),
        Box::new(EchoCompletion),
        Some(seeded_transports().await),
    );

    let answer = agent.answer("statut du vol XY999 ?").await;
    assert!(answer.contains("Aucun transport trouvé avec le numéro XY999."));
}

#[tokio::test]
async fn csv_analysis_redelimits_and_caps_content() {
    let agent = agent_with(
        PromptMode::FullDocument,
        Arc::new(Corpus::empty()),
        Arc::new(ErroringIndex),
        Box::new(EchoCompletion),
        None,
    );

    let answer = agent
        .analyze_csv("number,status\nTGV123,Delayed", "quels transports sont en retard ?")
        .await;
    assert!(answer.contains("number | status"));
    assert!(answer.contains("TGV123 | Delayed"));
    assert!(answer.contains("expert en analyse de données de transport"));
    assert!(answer.contains("QUESTION : quels transports sont en retard ?"));
}

#[tokio::test]
async fn completion_failure_becomes_a_readable_answer() {
    let agent = agent_with(
        PromptMode::FullDocument,
        manual_corpus(),
        Arc::new(ErroringIndex),
        Box::new(DisabledCompletion),
        None,
    );

    let answer = agent.answer("Quelle est la politique des horaires ?").await;
    assert!(answer.starts_with("Désolé, une erreur s'est produite"));
}

#[tokio::test]
async fn weather_question_without_api_key_degrades_gracefully() {
    let agent = agent_with(
        PromptMode::FullDocument,
        manual_corpus(),
        Arc::new(ErroringIndex),
        Box::new(EchoCompletion),
        None,
    );

    let answer = agent.answer("Quelle est la météo à Paris ?").await;
    assert!(answer.starts_with("Désolé, le service météo n'est pas disponible"));
}
