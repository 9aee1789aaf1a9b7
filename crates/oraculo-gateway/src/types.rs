use serde::{Deserialize, Serialize};

/// Ask request. Optional fields fall back to the engine's configured
/// defaults.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub topk: Option<usize>,
    pub min_score: Option<f64>,
    pub language: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

/// Reload response
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub documents: usize,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
