use crate::error::ServerResult;
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use korpus::{AnalysisBackend, SearchBackend};
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check<B>(State(state): State<Arc<ServerState<B>>>) -> impl IntoResponse
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    Json(json!({
        "status": "healthy",
        "service": "korpus-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Uptime and corpus cache counters
pub async fn metrics<B>(State(state): State<Arc<ServerState<B>>>) -> ServerResult<impl IntoResponse>
where
    B: SearchBackend + AnalysisBackend + 'static,
{
    let metadata = ServerMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Ok(Json(json!({
        "server": serde_json::to_value(metadata)?,
        "corpus_cache": serde_json::to_value(state.explorer.stats())?,
    })))
}
