use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

use oraculo_core::{FaqDocument, SqliteCorpusSource};

use crate::commands::build_embedder;
use crate::config::{Config, CorpusKind};

/// A FAQ entry as written by hand: the id is optional and gets generated.
#[derive(Debug, Deserialize)]
struct IngestEntry {
    id: Option<String>,
    question: String,
    answer: String,
    intent: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    source_link: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_language() -> String {
    "es".to_string()
}

fn default_active() -> bool {
    true
}

/// Load FAQ entries from a JSON file into the SQLite store, embedding new or
/// changed entries when an embedding provider is configured. Unchanged
/// entries (same content hash) are skipped entirely.
pub async fn execute(file: &Path, config: &Config) -> Result<()> {
    if config.corpus.kind != CorpusKind::Sqlite {
        anyhow::bail!("Ingest requires corpus.kind = \"sqlite\" (got json)");
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read ingest file: {:?}", file))?;
    let entries: Vec<IngestEntry> =
        serde_json::from_str(&content).context("Failed to parse ingest JSON")?;

    let store = SqliteCorpusSource::open(&config.corpus.expanded_path())
        .context("Failed to open the FAQ database")?;
    let embedder = build_embedder(config)?;

    let mut ingested = 0usize;
    let mut skipped = 0usize;

    // Resolve ids and drop unchanged entries before paying for embeddings
    let mut pending: Vec<(FaqDocument, String)> = Vec::new();
    for entry in entries {
        let id = entry
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let doc = FaqDocument {
            id: id.clone(),
            question: entry.question,
            answer: entry.answer,
            intent: entry.intent,
            tags: entry.tags,
            language: entry.language,
            source_link: entry.source_link,
            is_active: entry.is_active,
            embedding: None,
        };
        let hash = content_hash(&doc);
        if store.content_hash(&id)?.as_deref() == Some(hash.as_str()) {
            skipped += 1;
            continue;
        }
        pending.push((doc, hash));
    }

    if let Some(embedder) = &embedder {
        let texts: Vec<String> = pending
            .iter()
            .map(|(doc, _)| format!("{} {}", doc.question, doc.answer))
            .collect();
        if !texts.is_empty() {
            let vectors = embedder
                .embed_batch(&texts)
                .await
                .context("Failed to embed FAQ entries")?;
            anyhow::ensure!(
                vectors.len() == pending.len(),
                "Embedding batch returned {} vectors for {} entries",
                vectors.len(),
                pending.len()
            );
            for ((doc, _), vector) in pending.iter_mut().zip(vectors) {
                doc.embedding = Some(vector);
            }
        }
    }

    for (doc, hash) in &pending {
        store.upsert(doc, hash)?;
        ingested += 1;
    }

    info!(ingested, skipped, "Ingest complete");
    println!(
        "Ingested {} entries ({} unchanged, skipped). Active total: {}",
        ingested,
        skipped,
        store.count_active()?
    );
    Ok(())
}

fn content_hash(doc: &FaqDocument) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc.question.as_bytes());
    hasher.update(b"\n");
    hasher.update(doc.answer.as_bytes());
    hasher.update(b"\n");
    hasher.update(doc.intent.as_bytes());
    hasher.update(b"\n");
    hasher.update(doc.language.as_bytes());
    format!("{:x}", hasher.finalize())
}
