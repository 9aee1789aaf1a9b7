use anyhow::Result;
use tracing::{info, warn};

use oraculo_core::CorpusWatcher;
use oraculo_gateway::{start_server, AppState};

use crate::commands::build_engine;
use crate::config::{Config, CorpusKind};

pub async fn execute(host: Option<String>, port: Option<u16>, config: &Config) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!(host = %host, port, "Starting gateway server");

    let engine = build_engine(config).await?;
    info!(documents = engine.corpus_size().await, "Corpus loaded");

    if config.corpus.watch {
        if config.corpus.kind == CorpusKind::Json {
            let watcher = CorpusWatcher::new();
            watcher
                .watch(engine.clone(), config.corpus.expanded_path())
                .await?;
        } else {
            warn!("corpus.watch only applies to json corpora; ignoring");
        }
    }

    let state = AppState {
        engine,
        allowed_origins: config.server.allowed_origins.clone(),
    };

    start_server(state, &host, port).await?;

    Ok(())
}
