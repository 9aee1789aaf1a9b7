use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use oraculo_core::{IntentRule, RetrievalConfig};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Required when retrieval.hybrid is on
    pub embedding: Option<EmbeddingConfig>,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusKind {
    Json,
    Sqlite,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_kind")]
    pub kind: CorpusKind,

    /// Path to faq.json or the SQLite database, ~ expands
    #[serde(default = "default_corpus_path")]
    pub path: String,

    /// Hot-reload the corpus when the backing file changes (json only)
    #[serde(default)]
    pub watch: bool,
}

impl CorpusConfig {
    pub fn expanded_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    Keyword,
    Http,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_mode")]
    pub mode: ClassifierMode,

    /// Endpoint of the remote classifier (http mode)
    pub url: Option<String>,

    /// Keyword rules per intent (keyword mode)
    #[serde(default)]
    pub intents: Vec<IntentRule>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings API
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    /// Environment variable holding the API key, if the endpoint needs one
    pub api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_corpus_kind() -> CorpusKind {
    CorpusKind::Json
}

fn default_corpus_path() -> String {
    "./faq.json".to_string()
}

fn default_classifier_mode() -> ClassifierMode {
    ClassifierMode::Keyword
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            kind: default_corpus_kind(),
            path: default_corpus_path(),
            watch: false,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: default_classifier_mode(),
            url: None,
            intents: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            retrieval: RetrievalConfig::default(),
            classifier: ClassifierConfig::default(),
            embedding: None,
            server: ServerConfig::default(),
        }
    }
}

/// Load config from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse TOML config")?;

        Ok(config)
    } else {
        Ok(Config::default())
    }
}
