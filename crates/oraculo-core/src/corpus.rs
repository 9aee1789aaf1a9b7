use std::collections::HashMap;

use tracing::debug;

use crate::lexical::Bm25Index;
use crate::normalize::Normalizer;
use crate::semantic;
use crate::types::FaqDocument;

/// One intent-scoped pool: the subset of corpus documents carrying the label,
/// plus a BM25 index built over just that subset (so corpus statistics are
/// local to the pool, as scoped precision requires).
#[derive(Debug, Clone)]
struct IntentPool {
    doc_indices: Vec<usize>,
    index: Bm25Index,
}

/// An immutable corpus snapshot: documents in load order, one global lexical
/// index, and one lexical index per distinct intent label, all built with the
/// same tokenizer and question-weighting rule.
///
/// A reload builds a whole new `Corpus` and swaps it in behind the engine's
/// lock; snapshots already handed to in-flight queries stay valid.
#[derive(Debug, Clone)]
pub struct Corpus {
    docs: Vec<FaqDocument>,
    global: Bm25Index,
    by_intent: HashMap<String, IntentPool>,
}

impl Corpus {
    /// Build all derived indices from the loaded documents. Inactive
    /// documents are dropped here, so no pool ever sees them.
    pub fn build(
        documents: Vec<FaqDocument>,
        normalizer: &Normalizer,
        question_weight: usize,
    ) -> Self {
        let docs: Vec<FaqDocument> = documents.into_iter().filter(|d| d.is_active).collect();

        let tokenized: Vec<Vec<String>> = docs
            .iter()
            .map(|d| normalizer.normalize(&scoring_text(d, question_weight)))
            .collect();

        let global = Bm25Index::build(&tokenized);

        let mut by_intent: HashMap<String, IntentPool> = HashMap::new();
        let mut labels: Vec<String> = docs.iter().map(|d| d.intent.clone()).collect();
        labels.sort();
        labels.dedup();
        for label in labels {
            let doc_indices: Vec<usize> = docs
                .iter()
                .enumerate()
                .filter(|(_, d)| d.intent == label)
                .map(|(i, _)| i)
                .collect();
            let subset: Vec<Vec<String>> = doc_indices
                .iter()
                .map(|&i| tokenized[i].clone())
                .collect();
            let index = Bm25Index::build(&subset);
            by_intent.insert(label, IntentPool { doc_indices, index });
        }

        debug!(
            documents = docs.len(),
            intents = by_intent.len(),
            "Corpus built"
        );

        Self {
            docs,
            global,
            by_intent,
        }
    }

    pub fn docs(&self) -> &[FaqDocument] {
        &self.docs
    }

    pub fn doc(&self, index: usize) -> &FaqDocument {
        &self.docs[index]
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn has_intent(&self, label: &str) -> bool {
        self.by_intent.contains_key(label)
    }

    /// Distinct intent labels, sorted.
    pub fn intent_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.by_intent.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    /// BM25-rank the chosen pool against the query tokens. Results carry
    /// corpus-wide document indices, sorted by score descending with ties
    /// broken by ascending document id. Every pool document is scored, so
    /// low-scoring entries still appear when the pool is small.
    ///
    /// A `pool` label with no pool yields no candidates; callers decide how
    /// to treat an absent pool (see the router's fallback rules).
    pub fn lexical_top(
        &self,
        tokens: &[String],
        pool: Option<&str>,
        topk: usize,
    ) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = match pool {
            Some(label) => {
                let Some(scoped) = self.by_intent.get(label) else {
                    return Vec::new();
                };
                scoped
                    .index
                    .score(tokens)
                    .into_iter()
                    .enumerate()
                    .map(|(local, score)| (scoped.doc_indices[local], score))
                    .collect()
            }
            None => self.global.score(tokens).into_iter().enumerate().collect(),
        };

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.docs[a.0].id.cmp(&self.docs[b.0].id))
        });
        ranked.truncate(topk);
        ranked
    }

    /// Cosine-rank the chosen pool against a query embedding.
    pub fn semantic_top(
        &self,
        query: &[f32],
        pool: Option<&str>,
        language: Option<&str>,
        top_k: usize,
    ) -> Vec<(usize, f64)> {
        let indices = match pool {
            Some(label) => match self.by_intent.get(label) {
                Some(scoped) => Some(scoped.doc_indices.as_slice()),
                None => return Vec::new(),
            },
            None => None,
        };
        semantic::semantic_top(&self.docs, indices, query, language, top_k)
    }
}

/// Text a document is scored by: the question repeated `question_weight`
/// times, then the answer. Applied at corpus build only; queries are never
/// weighted.
fn scoring_text(doc: &FaqDocument, question_weight: usize) -> String {
    let question = doc.question.trim();
    let answer = doc.answer.trim();
    if question.is_empty() {
        return answer.to_string();
    }
    let mut text = String::with_capacity((question.len() + 1) * question_weight + answer.len());
    for _ in 0..question_weight.max(1) {
        text.push_str(question);
        text.push(' ');
    }
    text.push_str(answer);
    text
}
