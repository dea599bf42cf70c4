//! The assistant agent: classification, routing, and answer generation.
//!
//! [`Agent::answer`] is the single entry point for user questions. It never
//! fails; every downstream problem either degrades (retrieval, transport
//! lookups) or becomes a French error string the user can read (model
//! calls).

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{info, warn};

use crate::assemble::assemble;
use crate::classify::{Classifier, KeywordClassifier};
use crate::completion::{self, CompletionProvider, DisabledCompletion};
use crate::config::{Config, WeatherConfig};
use crate::csvdata::prepare_csv;
use crate::index::{DisabledIndex, InMemoryIndex, SimilaritySearch};
use crate::ingest::ingest_corpus;
use crate::models::{Corpus, IntentCategory};
use crate::prompt::{self, PromptMode};
use crate::retrieve::Retriever;
use crate::transport::{SqliteTransportRepository, TransportRepository};
use crate::weather::WeatherClient;

const WEATHER_SYSTEM_PROMPT: &str =
    "Tu es un assistant météo. Réponds en français, brièvement, \
     à partir des données JSON fournies dans le message de l'utilisateur. \
     N'invente aucune valeur.";

pub struct Agent {
    mode: PromptMode,
    corpus: Arc<Corpus>,
    classifier: KeywordClassifier,
    retriever: Retriever,
    index: Arc<dyn SimilaritySearch>,
    completion: Box<dyn CompletionProvider>,
    transports: Option<Arc<dyn TransportRepository>>,
    weather: WeatherConfig,
}

/// Wire an agent from configuration: ingest the corpus, pick the prompt
/// mode, build the similarity index, open the transport store.
///
/// Never fails; each optional collaborator degrades independently with a
/// warning, so a bare config still yields a working (if retrieval-only)
/// agent.
pub async fn build(config: &Config) -> Agent {
    let corpus = Arc::new(ingest_corpus(config));
    let mode = PromptMode::select(
        corpus.full_text.chars().count(),
        config.retrieval.full_document_threshold,
    );
    info!(
        mode = mode.as_str(),
        passages = corpus.passages.len(),
        chars = corpus.full_text.chars().count(),
        "prompt mode selected"
    );

    let index: Arc<dyn SimilaritySearch> = if config.embedding.is_enabled() {
        match InMemoryIndex::build(&corpus, &config.embedding).await {
            Ok(index) => Arc::new(index),
            Err(err) => {
                warn!(error = %err, "similarity index unavailable, cascade will skip vector search");
                Arc::new(DisabledIndex)
            }
        }
    } else {
        Arc::new(DisabledIndex)
    };

    let completion: Box<dyn CompletionProvider> = match completion::create_provider(&config.completion)
    {
        Ok(provider) => provider,
        Err(err) => {
            warn!(error = %err, "completion provider unavailable");
            Box::new(DisabledCompletion)
        }
    };

    let transports: Option<Arc<dyn TransportRepository>> =
        match SqliteTransportRepository::open(&config.transport).await {
            Ok(repo) => Some(Arc::new(repo)),
            Err(err) => {
                warn!(error = %err, "transport store unavailable");
                None
            }
        };

    Agent::new(
        mode,
        corpus,
        index,
        completion,
        transports,
        config.weather.clone(),
        config.retrieval.clone(),
    )
}

impl Agent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mode: PromptMode,
        corpus: Arc<Corpus>,
        index: Arc<dyn SimilaritySearch>,
        completion: Box<dyn CompletionProvider>,
        transports: Option<Arc<dyn TransportRepository>>,
        weather: WeatherConfig,
        retrieval: crate::config::RetrievalConfig,
    ) -> Self {
        let retriever = Retriever::new(corpus.clone(), index.clone(), retrieval);
        Self {
            mode,
            corpus,
            classifier: KeywordClassifier,
            retriever,
            index,
            completion,
            transports,
            weather,
        }
    }

    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Answer a user question. Never fails: model and upstream errors come
    /// back as readable French strings.
    pub async fn answer(&self, query: &str) -> String {
        let intent = self.classifier.classify(query);
        info!(intent = intent.as_str(), query, "question received");

        match intent {
            IntentCategory::Csv => self.answer_csv_query(query).await,
            IntentCategory::Transport => self.answer_transport(query).await,
            IntentCategory::Weather => self.answer_weather(query).await,
            IntentCategory::Document => self.answer_document(query).await,
        }
    }

    /// The document pipeline: retrieve, assemble, complete.
    async fn answer_document(&self, query: &str) -> String {
        let context = self.document_context(query).await;
        let system = prompt::system_prompt(self.mode, &self.corpus);
        let user = prompt::user_message(self.mode, &context, query);
        self.complete_or_apologize(&system, &user).await
    }

    /// Transport questions get live records prepended to the document
    /// context; a missing store degrades to the plain document pipeline.
    async fn answer_transport(&self, query: &str) -> String {
        let transport_block = self.transport_context(query).await;
        let context = self.document_context(query).await;
        let user = match &transport_block {
            Some(block) => {
                let enriched = format!("{block}\n\n{context}");
                prompt::user_message(PromptMode::Rag, &enriched, query)
            }
            None => prompt::user_message(self.mode, &context, query),
        };
        let system = prompt::system_prompt(self.mode, &self.corpus);
        self.complete_or_apologize(&system, &user).await
    }

    async fn answer_weather(&self, query: &str) -> String {
        let client = match WeatherClient::new(&self.weather) {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "weather client unavailable");
                return format!("Désolé, le service météo n'est pas disponible : {err}");
            }
        };

        let Some(location) = extract_location(query) else {
            return "Précisez un lieu pour la météo (par exemple : « Quelle est la météo à Paris ? »)."
                .to_string();
        };

        let data = if query.to_lowercase().contains("prévision")
            || query.to_lowercase().contains("forecast")
        {
            client.forecast(&location, 3).await
        } else {
            client.current(&location).await
        };

        match data {
            Ok(json) => {
                let user = format!("DONNÉES MÉTÉO ({location}) :\n{json}\n\nQUESTION :\n{query}");
                self.complete_or_apologize(WEATHER_SYSTEM_PROMPT, &user).await
            }
            Err(err) => {
                warn!(error = %err, location = location.as_str(), "weather lookup failed");
                format!("Désolé, une erreur s'est produite : {err}")
            }
        }
    }

    /// CSV intent arriving through chat: analyze the fenced block if the
    /// query carries one, otherwise treat it as a document question.
    async fn answer_csv_query(&self, query: &str) -> String {
        match extract_fenced_block(query) {
            Some((content, question)) => self.analyze_csv(&content, &question).await,
            None => self.answer_document(query).await,
        }
    }

    /// Analyze CSV content against a question.
    pub async fn analyze_csv(&self, csv_content: &str, query: &str) -> String {
        let prepared = prepare_csv(csv_content);
        let user = prompt::csv_user_message(&prepared, query);
        match self.completion.complete(prompt::csv_system_prompt(), &user).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "csv analysis failed");
                format!("Erreur lors de l'analyse : {err}")
            }
        }
    }

    /// Diagnostic report: corpus shape, a vector probe, a keyword probe,
    /// and the final assembled context for `query`.
    pub async fn diagnose(&self, query: &str) -> String {
        let mut report = String::from("=== DIAGNOSTIC RAG ===\n\n");

        let _ = writeln!(
            report,
            "Taille du document : {} caractères",
            self.corpus.full_text.chars().count()
        );
        let _ = writeln!(
            report,
            "Nombre total de passages : {}\n",
            self.corpus.passages.len()
        );

        match self.index.similarity_search(query, 5, 0.2).await {
            Ok(results) => {
                let _ = writeln!(report, "Recherche vectorielle : {} résultats", results.len());
                for (i, passage) in results.iter().take(3).enumerate() {
                    let _ = writeln!(report, "   - Résultat {} : {}...", i + 1, preview(&passage.content, 100));
                }
            }
            Err(err) => {
                let _ = writeln!(report, "Recherche vectorielle échouée : {err}");
            }
        }
        report.push('\n');

        let keyword_results = self.retriever.keyword_probe(query, 5);
        let _ = writeln!(
            report,
            "Recherche par mots-clés : {} résultats",
            keyword_results.len()
        );
        for (i, passage) in keyword_results.iter().take(3).enumerate() {
            let _ = writeln!(report, "   - Résultat {} : {}...", i + 1, preview(&passage.content, 100));
        }
        report.push('\n');

        let result = self.retriever.retrieve(query).await;
        let context = assemble(&result);
        let _ = writeln!(report, "Stratégie retenue : {}", result.strategy.as_str());
        let _ = writeln!(
            report,
            "Contexte final : {} caractères",
            context.chars().count()
        );
        let _ = writeln!(report, "Aperçu : {}...", preview(&context, 200));

        report
    }

    /// Retrieved context for RAG mode; full-document mode keeps context in
    /// the system prompt, so nothing is needed here.
    async fn document_context(&self, query: &str) -> String {
        match self.mode {
            PromptMode::FullDocument => String::new(),
            PromptMode::Rag => {
                let result = self.retriever.retrieve(query).await;
                info!(strategy = result.strategy.as_str(), passages = result.passages.len(), "context retrieved");
                assemble(&result)
            }
        }
    }

    /// Live transport records formatted as a context block, or `None` when
    /// the store is unavailable or holds nothing relevant.
    async fn transport_context(&self, query: &str) -> Option<String> {
        let repo = self.transports.as_ref()?;
        let mut block = String::from("=== INFORMATIONS TRANSPORT EN TEMPS RÉEL ===\n");
        let mut found = false;

        match repo.find_delayed().await {
            Ok(delayed) if !delayed.is_empty() => {
                found = true;
                block.push_str("Transports actuellement en retard :\n");
                for t in &delayed {
                    let _ = writeln!(block, "- {}", t.describe());
                }
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "delayed-transport lookup failed"),
        }

        if let Some(number) = extract_transport_number(query) {
            match repo.find_by_number(&number).await {
                Ok(Some(t)) => {
                    found = true;
                    let _ = writeln!(block, "Détails du transport {number} :\n- {}", t.describe());
                }
                Ok(None) => {
                    found = true;
                    let _ = writeln!(block, "Aucun transport trouvé avec le numéro {number}.");
                }
                Err(err) => warn!(error = %err, number = number.as_str(), "transport lookup failed"),
            }
        }

        block.push_str("=== FIN DES INFORMATIONS TRANSPORT ===");
        found.then_some(block)
    }

    async fn complete_or_apologize(&self, system: &str, user: &str) -> String {
        match self.completion.complete(system, user).await {
            Ok(answer) => {
                info!(chars = answer.chars().count(), "answer generated");
                answer
            }
            Err(err) => {
                warn!(error = %err, "completion failed");
                format!("Désolé, une erreur s'est produite : {err}")
            }
        }
    }
}

/// First `max` characters of `text`, respecting char boundaries.
fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// A transport number is an alphanumeric token mixing letters and digits,
/// like "TGV123" or "AF101". Matching is case-normalized to upper.
fn extract_transport_number(query: &str) -> Option<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .find(|token| {
            token.len() >= 3
                && token.chars().any(|c| c.is_ascii_digit())
                && token.chars().any(|c| c.is_alphabetic())
        })
        .map(str::to_uppercase)
}

/// Best-effort location extraction: the word after "à"/"a"/"in"/"at"/"pour",
/// or the last capitalized word that is not sentence-initial.
fn extract_location(query: &str) -> Option<String> {
    let words: Vec<&str> = query
        .split(|c: char| c.is_whitespace() || c == '?' || c == '!' || c == ',')
        .filter(|w| !w.is_empty())
        .collect();

    for window in words.windows(2) {
        let prep = window[0].to_lowercase();
        if matches!(prep.as_str(), "à" | "a" | "in" | "at" | "pour") {
            let candidate = window[1];
            if candidate.chars().next().is_some_and(char::is_uppercase) {
                return Some(candidate.to_string());
            }
        }
    }

    words
        .iter()
        .skip(1)
        .rev()
        .find(|w| w.chars().next().is_some_and(char::is_uppercase))
        .map(|w| w.to_string())
}

/// Split a chat message carrying a fenced block into (block content, the
/// text outside the fence).
fn extract_fenced_block(query: &str) -> Option<(String, String)> {
    let start = query.find("```")?;
    let after_fence = &query[start + 3..];
    let end = after_fence.find("```")?;

    let mut content = &after_fence[..end];
    // Drop the fence-line remainder, which may carry a language tag like
    // "csv". Anything else on the first line is data (a bare column
    // header looks like a tag but must be kept).
    if let Some(newline) = content.find('\n') {
        let first_line = content[..newline].trim();
        if first_line.is_empty() || matches!(first_line.to_lowercase().as_str(), "csv" | "text") {
            content = &content[newline + 1..];
        }
    }

    let question = format!(
        "{} {}",
        query[..start].trim(),
        after_fence[end + 3..].trim()
    )
    .trim()
    .to_string();

    Some((content.trim().to_string(), question))
}
