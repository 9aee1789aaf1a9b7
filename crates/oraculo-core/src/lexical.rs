use std::collections::HashMap;

// Okapi parameters. The router's min_score threshold is calibrated against
// scores produced by exactly this variant, including the negative-idf floor.
const BM25_K1: f64 = 1.5;
const BM25_B: f64 = 0.75;
const BM25_EPSILON: f64 = 0.25;

/// Immutable in-memory BM25 (Okapi) index over a tokenized document pool.
///
/// Built once per pool per corpus build; never mutated afterwards. A reload
/// constructs fresh indices and swaps them in wholesale.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    doc_term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<f64>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25Index {
    /// Build the index from pre-tokenized documents. O(total tokens).
    pub fn build(corpus: &[Vec<String>]) -> Self {
        let n = corpus.len();
        let mut doc_term_freqs = Vec::with_capacity(n);
        let mut doc_lens = Vec::with_capacity(n);
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for tokens in corpus {
            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token.clone()).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            doc_lens.push(tokens.len() as f64);
            doc_term_freqs.push(tf);
        }

        let avgdl = if n == 0 {
            0.0
        } else {
            doc_lens.iter().sum::<f64>() / n as f64
        };

        // idf = ln((N - df + 0.5) / (df + 0.5)); terms landing negative are
        // floored to epsilon * average raw idf.
        let mut idf: HashMap<String, f64> = HashMap::with_capacity(doc_freq.len());
        let mut idf_sum = 0.0;
        let mut negative: Vec<String> = Vec::new();
        for (term, df) in &doc_freq {
            let value = ((n as f64 - *df as f64 + 0.5) / (*df as f64 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term.clone(), value);
        }
        if !idf.is_empty() {
            let eps = BM25_EPSILON * (idf_sum / idf.len() as f64);
            for term in negative {
                idf.insert(term, eps);
            }
        }

        Self {
            doc_term_freqs,
            doc_lens,
            avgdl,
            idf,
        }
    }

    /// Score every document in the pool against the query tokens. The result
    /// is aligned to document order; unknown terms contribute nothing.
    /// Repeated query tokens contribute once per occurrence.
    pub fn score(&self, query: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_term_freqs.len()];
        for token in query {
            let Some(idf) = self.idf.get(token) else {
                continue;
            };
            for (i, tf_map) in self.doc_term_freqs.iter().enumerate() {
                let tf = f64::from(*tf_map.get(token).unwrap_or(&0));
                if tf == 0.0 {
                    continue;
                }
                let denom =
                    tf + BM25_K1 * (1.0 - BM25_B + BM25_B * self.doc_lens[i] / self.avgdl);
                scores[i] += idf * tf * (BM25_K1 + 1.0) / denom;
            }
        }
        scores
    }

    pub fn len(&self) -> usize {
        self.doc_term_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_term_freqs.is_empty()
    }
}
