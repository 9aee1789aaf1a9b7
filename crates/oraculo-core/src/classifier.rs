use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::Normalizer;
use crate::types::ClassifierResult;

/// Abstraction over the intent classifier. Anything that maps text to a
/// label plus a probability works; training pipelines live outside this
/// crate.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassifierResult>;
}

/// One intent with its trigger vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRule {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Rule-based classifier: scores each label by keyword hits over the
/// normalized query and turns hit counts into a probability. Fully
/// deterministic; ties resolve to the lexicographically first label.
pub struct KeywordIntentClassifier {
    rules: Vec<(String, HashSet<String>)>,
    normalizer: Normalizer,
}

impl KeywordIntentClassifier {
    /// Keywords run through the same normalizer as queries, so rules may be
    /// written with accents or synonym variants.
    pub fn new(rules: Vec<IntentRule>, normalizer: Normalizer) -> Self {
        let mut compiled: Vec<(String, HashSet<String>)> = rules
            .into_iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .flat_map(|k| normalizer.normalize(k))
                    .collect();
                (rule.label, keywords)
            })
            .collect();
        compiled.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            rules: compiled,
            normalizer,
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierResult> {
        let tokens = self.normalizer.normalize(text);

        let mut best: Option<(&str, usize)> = None;
        let mut total_hits = 0usize;
        for (label, keywords) in &self.rules {
            let hits = tokens.iter().filter(|t| keywords.contains(*t)).count();
            total_hits += hits;
            if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
                best = Some((label.as_str(), hits));
            }
        }

        match best {
            Some((label, hits)) => Ok(ClassifierResult {
                label: label.to_string(),
                confidence: hits as f64 / total_hits as f64,
            }),
            None => Ok(ClassifierResult {
                label: "unknown".to_string(),
                confidence: 0.0,
            }),
        }
    }
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

/// Remote classifier service speaking `POST {url} {"text": ...}` →
/// `{"label": ..., "confidence": ...}`. Transient failures retry with
/// exponential backoff; a final failure is fatal to the request.
pub struct HttpIntentClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpIntentClassifier {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierResult> {
        let max_retries = 3u32;
        let mut attempt = 0;

        loop {
            let resp = self
                .client
                .post(&self.url)
                .json(&ClassifyRequest { text })
                .send()
                .await;

            match resp {
                Ok(r) if r.status().is_success() => {
                    return r
                        .json::<ClassifierResult>()
                        .await
                        .context("Failed to parse classifier response");
                }
                Ok(r) => {
                    let status = r.status();
                    let body = r.text().await.unwrap_or_default();
                    if attempt < max_retries && (status.is_server_error() || status.as_u16() == 429)
                    {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!(attempt, %status, "Classifier error, retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        anyhow::bail!("Classifier error {}: {}", status, body);
                    }
                }
                Err(e) => {
                    if attempt < max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!(attempt, error = %e, "Classifier request failed, retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        return Err(e).context("Classifier request failed after retries");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rules() -> Vec<IntentRule> {
        vec![
            IntentRule {
                label: "despliegues".to_string(),
                keywords: vec![
                    "deploy".to_string(),
                    "despliegue".to_string(),
                    "produccion".to_string(),
                    "pipeline".to_string(),
                ],
            },
            IntentRule {
                label: "portal".to_string(),
                keywords: vec![
                    "portal".to_string(),
                    "formulario".to_string(),
                    "guardar".to_string(),
                ],
            },
            IntentRule {
                label: "errores".to_string(),
                keywords: vec!["error".to_string(), "errores".to_string()],
            },
        ]
    }

    fn classifier() -> KeywordIntentClassifier {
        KeywordIntentClassifier::new(sample_rules(), Normalizer::spanish())
    }

    #[tokio::test]
    async fn test_dominant_label_wins() {
        let result = classifier()
            .classify("el deploy a producción falló en el pipeline")
            .await
            .unwrap();
        assert_eq!(result.label, "despliegues");
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_confidence_splits_across_labels() {
        // "formulario" (portal) + "error" (errores): 1 hit each
        let result = classifier()
            .classify("error al abrir el formulario")
            .await
            .unwrap();
        assert!(result.confidence > 0.0 && result.confidence < 1.0);
        // Tie on hits → lexicographically first label
        assert_eq!(result.label, "errores");
    }

    #[tokio::test]
    async fn test_no_hits_returns_unknown() {
        let result = classifier().classify("hola buenos dias").await.unwrap();
        assert_eq!(result.label, "unknown");
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_keywords_normalized_like_queries() {
        // "deploy" is a synonym of "despliegue"; the user writing either
        // form must land on the same label.
        let a = classifier().classify("problema con el deploy").await.unwrap();
        let b = classifier()
            .classify("problema con el despliegue")
            .await
            .unwrap();
        assert_eq!(a.label, b.label);
        assert_eq!(a.label, "despliegues");
    }

    #[tokio::test]
    async fn test_deterministic_across_calls() {
        let c = classifier();
        let first = c.classify("error en el portal").await.unwrap();
        let second = c.classify("error en el portal").await.unwrap();
        assert_eq!(first.label, second.label);
        assert_eq!(first.confidence, second.confidence);
    }
}
