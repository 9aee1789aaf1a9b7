use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::engine::AskEngine;

/// Corpus reload event
#[derive(Debug, Clone)]
pub enum ReloadEvent {
    Success { documents: usize },
    Failure(String),
}

/// Watches the corpus data file and hot-reloads the engine when it changes.
/// A failed reload preserves the corpus already being served.
pub struct CorpusWatcher {
    reload_tx: broadcast::Sender<ReloadEvent>,
}

impl CorpusWatcher {
    pub fn new() -> Self {
        let (reload_tx, _) = broadcast::channel(10);
        Self { reload_tx }
    }

    /// Subscribe to reload events
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.reload_tx.subscribe()
    }

    /// Start watching the data file for changes. The debounce window absorbs
    /// editors that write in multiple syscalls.
    pub async fn watch(&self, engine: Arc<AskEngine>, data_path: PathBuf) -> Result<()> {
        let reload_tx = self.reload_tx.clone();

        // notify is not async; bridge through a std channel
        let (tx, rx) = std::sync::mpsc::channel();

        let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
            .context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(
                data_path.parent().unwrap_or(&data_path),
                notify::RecursiveMode::NonRecursive,
            )
            .context("Failed to watch corpus directory")?;

        info!(path = ?data_path, "Watching corpus file for changes");

        tokio::task::spawn_blocking(move || {
            // Keep debouncer alive
            let _debouncer = debouncer;

            for result in rx {
                match result {
                    Ok(events) => {
                        let relevant = events
                            .iter()
                            .any(|e| e.kind == DebouncedEventKind::Any && e.path == data_path);
                        if !relevant {
                            continue;
                        }

                        info!("Corpus file changed, reloading...");

                        let engine = engine.clone();
                        let rt = tokio::runtime::Handle::current();
                        match rt.block_on(engine.reload()) {
                            Ok(documents) => {
                                info!(documents, "Corpus reloaded from watcher");
                                let _ = reload_tx.send(ReloadEvent::Success { documents });
                            }
                            Err(e) => {
                                error!("Corpus reload failed: {}. Preserving old corpus.", e);
                                let _ = reload_tx.send(ReloadEvent::Failure(e.to_string()));
                            }
                        }
                    }
                    Err(e) => {
                        error!("File watcher error: {:?}", e);
                    }
                }
            }
        });

        Ok(())
    }
}

impl Default for CorpusWatcher {
    fn default() -> Self {
        Self::new()
    }
}
