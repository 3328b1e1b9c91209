//! HTTP API for faucet service

use super::error::{FaucetError, FaucetResult};
use super::metrics::gather_metrics;
use super::service::{FaucetRequest, FaucetResponse, FaucetService};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const FAUCET_PATHNAME: &str = "/api/faucet";

/// Build the application router
pub fn router(service: Arc<FaucetService>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route(FAUCET_PATHNAME, post(faucet_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(service)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS from the configured allow-list; empty or `*` allows any origin
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

/// Claim handler
pub async fn faucet_handler(
    State(service): State<Arc<FaucetService>>,
    payload: Result<Json<FaucetRequest>, JsonRejection>,
) -> FaucetResult<Json<FaucetResponse>> {
    let Json(request) = payload.map_err(|e| FaucetError::Validation(e.body_text()))?;
    info!("Faucet request: address={} chainId={}", request.address, request.chain_id);

    let response = service.claim_funds(request).await?;
    Ok(Json(response))
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Prometheus metrics handler
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}
