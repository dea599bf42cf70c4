use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Path to the source manual (plain text or markdown). Missing or
    /// unreadable files degrade to an empty corpus at startup.
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_passage_chars")]
    pub max_passage_chars: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_passage_chars: default_max_passage_chars(),
        }
    }
}

fn default_max_passage_chars() -> usize {
    1200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Passages requested from the similarity index per variation.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum similarity score for vector results.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// Maximum passages kept by the keyword fallback.
    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: usize,
    /// Maximum passages collected by the heuristic section scan.
    #[serde(default = "default_heuristic_limit")]
    pub heuristic_limit: usize,
    /// Corpora shorter than this (in characters) are embedded wholesale into
    /// the system prompt instead of retrieved per query.
    #[serde(default = "default_full_document_threshold")]
    pub full_document_threshold: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
            keyword_limit: default_keyword_limit(),
            heuristic_limit: default_heuristic_limit(),
            full_document_threshold: default_full_document_threshold(),
        }
    }
}

fn default_top_k() -> usize {
    8
}
fn default_min_score() -> f32 {
    0.15
}
fn default_keyword_limit() -> usize {
    8
}
fn default_heuristic_limit() -> usize {
    5
}
fn default_full_document_threshold() -> usize {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_completion_retries")]
    pub max_retries: u32,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            max_retries: default_completion_retries(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_completion_retries() -> u32 {
    3
}
fn default_completion_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_transport_db")]
    pub db_path: PathBuf,
    /// Load the built-in sample rows on startup when the table is empty.
    #[serde(default = "default_seed")]
    pub seed_sample_data: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            db_path: default_transport_db(),
            seed_sample_data: default_seed(),
        }
    }
}

fn default_transport_db() -> PathBuf {
    PathBuf::from("./data/transports.sqlite")
}
fn default_seed() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Environment variable holding the weatherapi.com key.
    #[serde(default = "default_weather_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_weather_key_env(),
            timeout_secs: default_weather_timeout_secs(),
        }
    }
}

fn default_weather_key_env() -> String {
    "WEATHER_API_KEY".to_string()
}
fn default_weather_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// A minimal config for commands and tests that run without a config
    /// file: no corpus, disabled providers, default tuning.
    pub fn minimal() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
            transport: TransportConfig::default(),
            weather: WeatherConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate corpus
    if config.corpus.max_passage_chars == 0 {
        anyhow::bail!("corpus.max_passage_chars must be > 0");
    }

    // Validate retrieval
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be > 0");
    }
    if config.retrieval.keyword_limit == 0 {
        anyhow::bail!("retrieval.keyword_limit must be > 0");
    }
    if !(0.0..=1.0).contains(&config.retrieval.min_score) {
        anyhow::bail!("retrieval.min_score must be in [0.0, 1.0]");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    // Validate completion
    if config.completion.is_enabled() && config.completion.model.is_none() {
        anyhow::bail!(
            "completion.model must be specified when provider is '{}'",
            config.completion.provider
        );
    }

    match config.completion.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown completion provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("qc.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let (_dir, path) = write_config("");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.retrieval.top_k, 8);
        assert_eq!(cfg.retrieval.full_document_threshold, 10_000);
        assert!(!cfg.embedding.is_enabled());
        assert!(!cfg.completion.is_enabled());
    }

    #[test]
    fn test_rejects_zero_top_k() {
        let (_dir, path) = write_config("[retrieval]\ntop_k = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_zero_max_passage_chars() {
        let (_dir, path) = write_config("[corpus]\nmax_passage_chars = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_unknown_completion_provider() {
        let (_dir, path) = write_config("[completion]\nprovider = \"ollama\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_embedding_requires_model_and_dims() {
        let (_dir, path) = write_config("[embedding]\nprovider = \"openai\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_valid_openai_embedding() {
        let (_dir, path) = write_config(
            "[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 1536\n",
        );
        let cfg = load_config(&path).unwrap();
        assert!(cfg.embedding.is_enabled());
    }
}
