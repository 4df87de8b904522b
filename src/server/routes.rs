//! HTTP routes for the tool server.
//!
//! - `POST <path>` - JSON-RPC endpoint (default `/mcp`)
//! - `/health` - health check

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use super::ServerState;
use super::processor::{SERVER_NAME, handle_message};

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVER_NAME,
    }))
}

/// JSON-RPC over HTTP: one message per request body.
pub async fn rpc(State(state): State<ServerState>, body: String) -> Response {
    debug!(bytes = body.len(), "rpc request");
    match handle_message(&state, &body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
