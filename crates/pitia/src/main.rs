mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    oraculo_core::init_logging();

    // Parse CLI args
    let cli = Cli::parse();

    // Handle init command early (doesn't need config)
    if let Commands::Init { path } = &cli.command {
        return commands::init::run_init(path);
    }

    // Load config
    let config = config::load_config(cli.config.as_deref())?;

    // Dispatch to command
    match cli.command {
        Commands::Init { .. } => {
            // Already handled above
            unreachable!()
        }
        Commands::Ask {
            question,
            topk,
            min_score,
            debug,
        } => {
            commands::ask::execute(&question, topk, min_score, debug, &config).await?;
        }
        Commands::Ingest { file } => {
            commands::ingest::execute(&file, &config).await?;
        }
        Commands::Serve { host, port } => {
            commands::serve::execute(host, port, &config).await?;
        }
    }

    Ok(())
}
