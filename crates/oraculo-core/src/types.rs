use serde::{Deserialize, Serialize};

/// A FAQ entry as loaded from a corpus source. Immutable once loaded;
/// identity is `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqDocument {
    /// Unique identifier
    pub id: String,
    /// Canonical question text
    pub question: String,
    /// Answer served to the user
    pub answer: String,
    /// Intent label used to build the scoped retrieval pool
    pub intent: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub source_link: Option<String>,
    /// Inactive entries are dropped at corpus build
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Unit-norm embedding of `question + " " + answer`, present in hybrid mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

fn default_language() -> String {
    "es".to_string()
}

fn default_active() -> bool {
    true
}

/// Output of the external intent classifier. The router treats it as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub label: String,
    /// Probability of `label` over the classifier's label set, in [0, 1]
    pub confidence: f64,
}

/// One ranked retrieval candidate. `doc_index` points into the corpus
/// snapshot the decision was made against.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub doc_index: usize,
    pub lexical_score: f64,
    pub semantic_score: f64,
    /// `alpha*semantic + (1-alpha)*lexical`; equals `lexical_score` when
    /// semantic scoring did not run
    pub fused_score: f64,
}

/// Which document pool the final (post-fallback) query ran against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolScope {
    Intent,
    Global,
}

/// Outcome of one routing pass: the chosen pool, whether the global
/// fallback fired, and the final ranked candidates.
#[derive(Debug, Clone)]
pub struct RouterDecision {
    pub pool_scope: PoolScope,
    pub used_fallback: bool,
    pub candidates: Vec<ScoredCandidate>,
    pub ambiguous: bool,
}

impl RouterDecision {
    pub fn top(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }
}

/// Per-query overrides accepted alongside the question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskOptions {
    pub topk: Option<usize>,
    pub min_score: Option<f64>,
    /// Restrict the semantic side to documents in this language (hybrid mode)
    pub language: Option<String>,
    /// Include the ranked candidate list in the response
    #[serde(default)]
    pub debug: bool,
}

/// Candidate entry included in debug responses.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDebug {
    pub id: String,
    pub question: String,
    pub lexical_score: f64,
    pub semantic_score: f64,
    pub score: f64,
}

/// The assembled answer payload.
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub intent: String,
    pub confidence: f64,
    pub answer: String,
    pub source_id: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,
    /// Candidate questions offered when the answer is ambiguous
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateDebug>>,
    pub used_fallback: bool,
}
