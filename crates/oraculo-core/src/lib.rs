pub mod classifier;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod fusion;
pub mod lexical;
pub mod normalize;
pub mod router;
pub mod semantic;
pub mod source;
pub mod types;
pub mod watch;

pub use classifier::{HttpIntentClassifier, IntentClassifier, IntentRule, KeywordIntentClassifier};
pub use config::RetrievalConfig;
pub use corpus::Corpus;
pub use embedding::{EmbeddingProvider, HttpEmbedding};
pub use engine::{
    AskEngine, MSG_AMBIGUOUS_QUERY, MSG_COULD_NOT_UNDERSTAND, MSG_NO_INFORMATION,
};
pub use lexical::Bm25Index;
pub use normalize::Normalizer;
pub use router::{ConfidenceRouter, RoutedQuery};
pub use source::{CorpusSource, JsonCorpusSource, SqliteCorpusSource};
pub use types::{
    AskOptions, AskResponse, CandidateDebug, ClassifierResult, FaqDocument, PoolScope,
    RouterDecision, ScoredCandidate,
};
pub use watch::{CorpusWatcher, ReloadEvent};

/// Initialize structured JSON logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
