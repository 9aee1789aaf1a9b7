pub mod ask;
pub mod ingest;
pub mod init;
pub mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};

use oraculo_core::{
    AskEngine, CorpusSource, EmbeddingProvider, HttpEmbedding, HttpIntentClassifier,
    IntentClassifier, JsonCorpusSource, KeywordIntentClassifier, Normalizer, SqliteCorpusSource,
};

use crate::config::{ClassifierMode, Config, CorpusKind};

/// Wire collaborators from config and load the initial corpus.
pub async fn build_engine(config: &Config) -> Result<Arc<AskEngine>> {
    let normalizer = Normalizer::spanish();
    let path = config.corpus.expanded_path();

    let source: Arc<dyn CorpusSource> = match config.corpus.kind {
        CorpusKind::Json => Arc::new(JsonCorpusSource::new(&path)),
        CorpusKind::Sqlite => Arc::new(
            SqliteCorpusSource::open(&path).context("Failed to open the FAQ database")?,
        ),
    };

    let classifier: Arc<dyn IntentClassifier> = match config.classifier.mode {
        ClassifierMode::Keyword => Arc::new(KeywordIntentClassifier::new(
            config.classifier.intents.clone(),
            normalizer.clone(),
        )),
        ClassifierMode::Http => {
            let url = config
                .classifier
                .url
                .as_deref()
                .context("classifier.url is required in http mode")?;
            Arc::new(HttpIntentClassifier::new(url))
        }
    };

    let embedder = build_embedder(config)?;

    let engine = AskEngine::new(
        config.retrieval.clone(),
        normalizer,
        classifier,
        embedder,
        source,
    )
    .await?;

    Ok(Arc::new(engine))
}

pub fn build_embedder(config: &Config) -> Result<Option<Arc<dyn EmbeddingProvider>>> {
    let Some(embedding) = &config.embedding else {
        return Ok(None);
    };

    let mut provider = HttpEmbedding::new(
        &embedding.base_url,
        &embedding.model,
        embedding.dimensions,
    );
    if let Some(env_var) = &embedding.api_key_env {
        let key = std::env::var(env_var)
            .with_context(|| format!("Embedding API key env var {env_var} not set"))?;
        provider = provider.with_api_key(&key);
    }
    Ok(Some(Arc::new(provider)))
}
