//! Health endpoint.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Liveness probe. Deliberately does not touch Postgres or Redis.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
