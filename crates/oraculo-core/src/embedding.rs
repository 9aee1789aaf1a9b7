use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::semantic::l2_normalize;

/// Abstraction for text → vector embedding providers. Implementations must
/// return unit-norm vectors; the semantic scorer relies on that to keep
/// cosine scores in [-1, 1].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn dimensions(&self) -> usize;
}

/// Embedding over an OpenAI-compatible `/embeddings` endpoint, which also
/// covers self-hosted sentence-transformer servers. Responses are re-scaled
/// to unit norm regardless of what the model returns.
pub struct HttpEmbedding {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dims: usize,
}

impl HttpEmbedding {
    pub fn new(base_url: &str, model: &str, dims: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            model: model.to_string(),
            dims,
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .context("Empty embedding response")
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let max_retries = 3u32;
        let mut attempt = 0;
        let url = format!("{}/embeddings", self.base_url);

        loop {
            let body = EmbeddingRequest {
                model: self.model.clone(),
                input: texts.to_vec(),
            };

            let mut request = self.client.post(&url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(r) if r.status().is_success() => {
                    let data: EmbeddingResponse = r
                        .json()
                        .await
                        .context("Failed to parse embedding response")?;
                    let mut vectors: Vec<Vec<f32>> =
                        data.data.into_iter().map(|d| d.embedding).collect();
                    for v in &mut vectors {
                        l2_normalize(v);
                    }
                    return Ok(vectors);
                }
                Ok(r) => {
                    let status = r.status();
                    let text = r.text().await.unwrap_or_default();
                    if attempt < max_retries && (status.is_server_error() || status.as_u16() == 429)
                    {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!(attempt, %status, "Embedding API error, retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        anyhow::bail!("Embedding API error {}: {}", status, text);
                    }
                }
                Err(e) => {
                    if attempt < max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!(attempt, error = %e, "Embedding request failed, retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        return Err(e).context("Embedding API request failed after retries");
                    }
                }
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Deterministic hash-derived embeddings for tests: no network, unit norm.
#[cfg(test)]
pub struct MockEmbedding {
    dims: usize,
}

#[cfg(test)]
impl MockEmbedding {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

#[cfg(test)]
#[async_trait]
impl EmbeddingProvider for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(text.as_bytes());
        let mut vec: Vec<f32> = (0..self.dims)
            .map(|i| {
                let byte = hash[i % 32] as f32;
                (byte / 255.0) * 2.0 - 1.0
            })
            .collect();
        l2_normalize(&mut vec);
        Ok(vec)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
