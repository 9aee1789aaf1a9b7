use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::classifier::IntentClassifier;
use crate::config::RetrievalConfig;
use crate::corpus::Corpus;
use crate::embedding::EmbeddingProvider;
use crate::normalize::Normalizer;
use crate::router::{ConfidenceRouter, RoutedQuery};
use crate::source::CorpusSource;
use crate::types::{AskOptions, AskResponse, CandidateDebug, ClassifierResult, FaqDocument, RouterDecision};

/// Fixed response when the query is empty or whitespace. The classifier is
/// never invoked for these.
pub const MSG_COULD_NOT_UNDERSTAND: &str = "No entendí la pregunta. ¿Puedes reformularla?";
/// Fixed response when the full fallback chain produced no candidates.
pub const MSG_NO_INFORMATION: &str = "No encontré información para esa pregunta.";
/// Clarification served instead of the top answer when the result is
/// ambiguous. Top id/score and the fallback flag are still reported.
pub const MSG_AMBIGUOUS_QUERY: &str =
    "La consulta es ambigua o con poca evidencia. ¿Puedes dar más contexto?";

/// Orchestrates classification, routing and response assembly over a shared
/// corpus snapshot.
///
/// Queries only ever read; the corpus is replaced wholesale by `reload`, so
/// in-flight requests keep the snapshot they started with and never observe
/// a half-built index.
pub struct AskEngine {
    config: RetrievalConfig,
    normalizer: Normalizer,
    router: ConfidenceRouter,
    classifier: Arc<dyn IntentClassifier>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    source: Arc<dyn CorpusSource>,
    corpus: RwLock<Arc<Corpus>>,
    reload_lock: Mutex<()>,
}

impl AskEngine {
    /// Build the engine and load the initial corpus from `source`.
    pub async fn new(
        config: RetrievalConfig,
        normalizer: Normalizer,
        classifier: Arc<dyn IntentClassifier>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        source: Arc<dyn CorpusSource>,
    ) -> Result<Self> {
        config.validate()?;
        if config.hybrid && embedder.is_none() {
            anyhow::bail!("Hybrid mode requires an embedding provider");
        }

        let router = ConfidenceRouter::new(config.clone());
        let empty = Corpus::build(Vec::new(), &normalizer, config.question_weight);
        let engine = Self {
            config,
            normalizer,
            router,
            classifier,
            embedder,
            source,
            corpus: RwLock::new(Arc::new(empty)),
            reload_lock: Mutex::new(()),
        };
        engine.reload().await.context("Initial corpus load failed")?;
        Ok(engine)
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub async fn corpus_size(&self) -> usize {
        self.corpus.read().await.len()
    }

    /// Answer one question. Collaborator failures (classifier, embedding)
    /// are fatal to the request and propagate as errors.
    pub async fn ask(&self, question: &str, opts: &AskOptions) -> Result<AskResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(AskResponse {
                intent: "unknown".to_string(),
                confidence: 0.0,
                answer: MSG_COULD_NOT_UNDERSTAND.to_string(),
                source_id: "none".to_string(),
                score: 0.0,
                source_link: None,
                suggestions: None,
                candidates: opts.debug.then(Vec::new),
                used_fallback: false,
            });
        }

        let classification = self
            .classifier
            .classify(question)
            .await
            .context("Intent classification failed")?;

        let tokens = self.normalizer.normalize(question);
        let embedding = match &self.embedder {
            Some(embedder) if self.config.hybrid => Some(
                embedder
                    .embed(question)
                    .await
                    .context("Query embedding failed")?,
            ),
            _ => None,
        };

        let corpus = self.corpus.read().await.clone();
        let topk = opts.topk.unwrap_or(self.config.topk).max(1);
        let min_score = opts.min_score.unwrap_or(self.config.min_score);

        let query = RoutedQuery {
            tokens: &tokens,
            embedding: embedding.as_deref(),
            language: opts.language.as_deref(),
        };
        let decision = self
            .router
            .route(&corpus, &query, &classification, topk, min_score);

        Ok(assemble(&corpus, &classification, &decision, opts.debug))
    }

    /// Rebuild the corpus from the source and swap it in atomically.
    /// Concurrent reloads are serialized; a failure leaves the current
    /// corpus untouched.
    pub async fn reload(&self) -> Result<usize> {
        let _guard = self.reload_lock.lock().await;

        let documents = self
            .source
            .load_documents()
            .context("Failed to load corpus documents")?;
        let documents = self.embed_missing(documents).await?;

        let corpus = Arc::new(Corpus::build(
            documents,
            &self.normalizer,
            self.config.question_weight,
        ));
        let size = corpus.len();
        *self.corpus.write().await = corpus;

        info!(documents = size, "Corpus reloaded");
        Ok(size)
    }

    /// In hybrid mode, fill in embeddings the source did not provide.
    async fn embed_missing(&self, mut documents: Vec<FaqDocument>) -> Result<Vec<FaqDocument>> {
        let Some(embedder) = &self.embedder else {
            return Ok(documents);
        };
        if !self.config.hybrid {
            return Ok(documents);
        }

        let missing: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_active && d.embedding.is_none())
            .map(|(i, _)| i)
            .collect();
        if missing.is_empty() {
            return Ok(documents);
        }

        let texts: Vec<String> = missing
            .iter()
            .map(|&i| format!("{} {}", documents[i].question, documents[i].answer))
            .collect();
        let vectors = embedder
            .embed_batch(&texts)
            .await
            .context("Failed to embed corpus documents")?;
        anyhow::ensure!(
            vectors.len() == missing.len(),
            "Embedding batch returned {} vectors for {} documents",
            vectors.len(),
            missing.len()
        );

        info!(count = missing.len(), "Embedded documents without stored vectors");
        for (i, vector) in missing.into_iter().zip(vectors) {
            documents[i].embedding = Some(vector);
        }
        Ok(documents)
    }
}

fn assemble(
    corpus: &Corpus,
    classification: &ClassifierResult,
    decision: &RouterDecision,
    debug: bool,
) -> AskResponse {
    let candidates = debug.then(|| {
        decision
            .candidates
            .iter()
            .map(|c| {
                let doc = corpus.doc(c.doc_index);
                CandidateDebug {
                    id: doc.id.clone(),
                    question: doc.question.clone(),
                    lexical_score: c.lexical_score,
                    semantic_score: c.semantic_score,
                    score: c.fused_score,
                }
            })
            .collect()
    });

    let Some(top) = decision.top() else {
        return AskResponse {
            intent: classification.label.clone(),
            confidence: classification.confidence,
            answer: MSG_NO_INFORMATION.to_string(),
            source_id: "none".to_string(),
            score: 0.0,
            source_link: None,
            suggestions: None,
            candidates,
            used_fallback: decision.used_fallback,
        };
    };

    let doc = corpus.doc(top.doc_index);
    if decision.ambiguous {
        let suggestions: Vec<String> = decision
            .candidates
            .iter()
            .take(3)
            .map(|c| corpus.doc(c.doc_index).question.clone())
            .collect();
        return AskResponse {
            intent: classification.label.clone(),
            confidence: classification.confidence,
            answer: MSG_AMBIGUOUS_QUERY.to_string(),
            source_id: doc.id.clone(),
            score: top.fused_score,
            source_link: None,
            suggestions: Some(suggestions),
            candidates,
            used_fallback: decision.used_fallback,
        };
    }

    AskResponse {
        intent: classification.label.clone(),
        confidence: classification.confidence,
        answer: doc.answer.clone(),
        source_id: doc.id.clone(),
        score: top.fused_score,
        source_link: doc.source_link.clone(),
        suggestions: None,
        candidates,
        used_fallback: decision.used_fallback,
    }
}
