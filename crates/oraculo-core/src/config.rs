use anyhow::Result;
use serde::{Deserialize, Serialize};

/// All retrieval thresholds in one immutable value, passed into the router
/// at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Classifier confidence at or above which the intent-scoped pool is
    /// trusted first
    #[serde(default = "default_tau_hi")]
    pub tau_hi: f64,

    /// Classifier confidence at or below which the scoped search is skipped
    /// entirely
    #[serde(default = "default_tau_lo")]
    pub tau_lo: f64,

    /// Minimum top score a scoped search must reach to avoid the global
    /// fallback
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Number of candidates returned per decision
    #[serde(default = "default_topk")]
    pub topk: usize,

    /// How many times the question text is repeated in a document's scoring
    /// text. Applied when the corpus is built, never to queries.
    #[serde(default = "default_question_weight")]
    pub question_weight: usize,

    /// Enable semantic scoring and score fusion
    #[serde(default)]
    pub hybrid: bool,

    /// Weight of the semantic score in the fused ranking
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Candidates fetched from each side before fusion
    #[serde(default = "default_hybrid_top_k_per_side")]
    pub hybrid_top_k_per_side: usize,
}

fn default_tau_hi() -> f64 {
    0.80
}

fn default_tau_lo() -> f64 {
    0.50
}

fn default_min_score() -> f64 {
    0.05
}

fn default_topk() -> usize {
    3
}

fn default_question_weight() -> usize {
    3
}

fn default_alpha() -> f64 {
    0.55
}

fn default_hybrid_top_k_per_side() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            tau_hi: default_tau_hi(),
            tau_lo: default_tau_lo(),
            min_score: default_min_score(),
            topk: default_topk(),
            question_weight: default_question_weight(),
            hybrid: false,
            alpha: default_alpha(),
            hybrid_top_k_per_side: default_hybrid_top_k_per_side(),
        }
    }
}

impl RetrievalConfig {
    /// Reject threshold combinations the router cannot interpret.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.tau_lo) || !(0.0..=1.0).contains(&self.tau_hi) {
            anyhow::bail!("confidence thresholds must lie in [0, 1]");
        }
        if self.tau_lo > self.tau_hi {
            anyhow::bail!(
                "tau_lo ({}) must not exceed tau_hi ({})",
                self.tau_lo,
                self.tau_hi
            );
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            anyhow::bail!("alpha must lie in [0, 1]");
        }
        if self.topk == 0 {
            anyhow::bail!("topk must be at least 1");
        }
        Ok(())
    }
}
