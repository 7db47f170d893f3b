//! Liveness and readiness probes.

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::server::AppState;

pub fn health_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "trellis-web"
    }))
}

/// Ready once the schema registry is loaded, which happens before the
/// listener binds; the probe reports what was loaded.
async fn ready_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "types": state.rewriter.registry().len(),
        "endpoint": state.client.endpoint(),
    }))
}
