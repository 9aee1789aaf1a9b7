use anyhow::Result;

use oraculo_core::AskOptions;

use crate::commands::build_engine;
use crate::config::Config;

pub async fn execute(
    question: &str,
    topk: Option<usize>,
    min_score: Option<f64>,
    debug: bool,
    config: &Config,
) -> Result<()> {
    let engine = build_engine(config).await?;

    let opts = AskOptions {
        topk,
        min_score,
        language: None,
        debug,
    };
    let response = engine.ask(question, &opts).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
