use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use oraculo_core::{AskEngine, AskOptions, AskResponse};

use crate::types::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AskEngine>,
    pub allowed_origins: Vec<String>,
}

/// Create the Axum router with all routes
pub fn create_router(state: AppState) -> Router {
    // Build CORS layer
    let cors = if state.allowed_origins.is_empty() {
        // Permissive for development
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(
                state
                    .allowed_origins
                    .iter()
                    .map(|s| s.parse().unwrap())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/ask", post(ask))
        .route("/api/v1/reload", post(reload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the gateway server
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!(addr = %addr, "Starting gateway server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    info!("Shutdown signal received, draining connections...");
}

// --- REST Handlers ---

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

const MAX_QUESTION_LENGTH: usize = 10_000; // 10KB

async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, Json<ErrorResponse>)> {
    // Input validation
    if req.question.len() > MAX_QUESTION_LENGTH {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorResponse {
                error: format!(
                    "Question exceeds maximum length of {} bytes",
                    MAX_QUESTION_LENGTH
                ),
            }),
        ));
    }

    let opts = AskOptions {
        topk: req.topk,
        min_score: req.min_score,
        language: req.language,
        debug: req.debug,
    };

    match state.engine.ask(&req.question, &opts).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Retrieval unavailable: {e:#}"),
            }),
        )),
    }
}

async fn reload(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.reload().await {
        Ok(documents) => Ok(Json(ReloadResponse {
            status: "ok".to_string(),
            documents,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
