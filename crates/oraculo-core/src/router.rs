use tracing::debug;

use crate::config::RetrievalConfig;
use crate::corpus::Corpus;
use crate::fusion;
use crate::types::{ClassifierResult, PoolScope, RouterDecision, ScoredCandidate};

/// A query after preprocessing: normalized tokens, plus the query embedding
/// and language restriction when hybrid scoring is on.
#[derive(Debug, Clone, Copy)]
pub struct RoutedQuery<'a> {
    pub tokens: &'a [String],
    pub embedding: Option<&'a [f32]>,
    pub language: Option<&'a str>,
}

/// The confidence-gated pool selector.
///
/// Scoped search buys precision when the classifier is sure; the global
/// fallback guards against a wrong-but-confident intent prediction starving
/// the answer of any matching document, at the cost of one extra pool query
/// on the fallback path.
pub struct ConfidenceRouter {
    config: RetrievalConfig,
}

impl ConfidenceRouter {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// One routing pass over a corpus snapshot. `topk` and `min_score`
    /// arrive already resolved (per-query override or configured default).
    ///
    /// Branches on classifier confidence:
    /// - `<= tau_lo`: skip the scoped pool entirely, query global.
    /// - otherwise: scoped pool first; re-query global when the scoped top
    ///   score falls under `min_score` or the pool yields nothing. A label
    ///   with no pool at all routes straight to global.
    pub fn route(
        &self,
        corpus: &Corpus,
        query: &RoutedQuery<'_>,
        classification: &ClassifierResult,
        topk: usize,
        min_score: f64,
    ) -> RouterDecision {
        let label = classification.label.as_str();
        let confidence = classification.confidence;

        let (pool_scope, used_fallback, candidates) = if confidence <= self.config.tau_lo {
            debug!(label, confidence, "Low confidence, querying global pool");
            (
                PoolScope::Global,
                true,
                self.search_pool(corpus, query, None, topk),
            )
        } else if !corpus.has_intent(label) {
            debug!(label, "No scoped pool for label, querying global pool");
            (
                PoolScope::Global,
                true,
                self.search_pool(corpus, query, None, topk),
            )
        } else {
            let scoped = self.search_pool(corpus, query, Some(label), topk);
            let weak = scoped
                .first()
                .map_or(true, |top| top.fused_score < min_score);
            if weak {
                debug!(
                    label,
                    confidence, "Scoped evidence below min_score, falling back to global pool"
                );
                (
                    PoolScope::Global,
                    true,
                    self.search_pool(corpus, query, None, topk),
                )
            } else {
                (PoolScope::Intent, false, scoped)
            }
        };

        let ambiguous = is_ambiguous(&candidates, min_score);

        RouterDecision {
            pool_scope,
            used_fallback,
            candidates,
            ambiguous,
        }
    }

    /// Rank one pool. Hybrid mode fetches `hybrid_top_k_per_side` candidates
    /// from each scorer and fuses them; otherwise the BM25 ranking is the
    /// final ranking (`fused_score == lexical_score`).
    fn search_pool(
        &self,
        corpus: &Corpus,
        query: &RoutedQuery<'_>,
        pool: Option<&str>,
        topk: usize,
    ) -> Vec<ScoredCandidate> {
        if self.config.hybrid {
            if let Some(embedding) = query.embedding {
                let side_k = self.config.hybrid_top_k_per_side;
                // The lexical side only contributes documents it actually
                // matched; zero-score rows would just pad the join.
                let lexical: Vec<(usize, f64)> = corpus
                    .lexical_top(query.tokens, pool, side_k)
                    .into_iter()
                    .filter(|(_, score)| *score > 0.0)
                    .collect();
                let semantic = corpus.semantic_top(embedding, pool, query.language, side_k);
                return fusion::fuse(corpus.docs(), &lexical, &semantic, self.config.alpha, topk);
            }
        }

        corpus
            .lexical_top(query.tokens, pool, topk)
            .into_iter()
            .map(|(doc_index, score)| ScoredCandidate {
                doc_index,
                lexical_score: score,
                semantic_score: 0.0,
                fused_score: score,
            })
            .collect()
    }
}

/// A result is ambiguous only when the top score is weak in absolute terms
/// AND barely separated from the runner-up. A strong top answer is never
/// flagged, however close second place is.
fn is_ambiguous(candidates: &[ScoredCandidate], min_score: f64) -> bool {
    if candidates.len() < 2 {
        return false;
    }
    let top = candidates[0].fused_score;
    let separation = top - candidates[1].fused_score;
    top < min_score.max(0.1) && separation < 0.02
}
