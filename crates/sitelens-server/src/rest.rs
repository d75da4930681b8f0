//! HTTP REST API.
//!
//! `GET /health` (also `/healthz`) reports liveness and whether a browser is
//! available.
//! `POST /scrape` runs one extraction under the request deadline.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use sitelens::Extractor;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;

/// State shared by all handlers.
pub struct AppState {
    pub extractor: Extractor,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/scrape", post(scrape))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("sitelens listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "browser": state.extractor.renderer().is_available(),
    }))
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::MalformedInput(e.body_text()))?;
    tracing::info!("scrape request for {}", request.url);

    let result = tokio::time::timeout(state.request_timeout, state.extractor.extract(&request.url))
        .await
        .map_err(|_| {
            tracing::warn!("scrape of {} exceeded {:?}", request.url, state.request_timeout);
            ApiError::Timeout(state.request_timeout)
        })??;

    Ok(Json(serde_json::json!({ "result": result })))
}
