use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pitia")]
#[command(about = "Oraculo - FAQ answering over confidence-gated retrieval", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a config file plus a sample corpus
    Init {
        /// Path for new config file
        #[arg(default_value = "oraculo.toml")]
        path: PathBuf,
    },
    /// Ask a single question and print the response as JSON
    Ask {
        /// Question text
        question: String,
        /// Number of candidates to rank
        #[arg(long)]
        topk: Option<usize>,
        /// Minimum scoped score before falling back to the global pool
        #[arg(long)]
        min_score: Option<f64>,
        /// Include the ranked candidate list in the output
        #[arg(long)]
        debug: bool,
    },
    /// Load FAQ entries from a JSON file into the SQLite store
    Ingest {
        /// Path to JSON file with FAQ entries
        #[arg(long)]
        file: PathBuf,
    },
    /// Start the HTTP gateway server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}
