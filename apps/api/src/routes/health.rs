use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

fn loaded(flag: bool) -> &'static str {
    if flag {
        "loaded"
    } else {
        "missing"
    }
}

/// GET /health
/// Reports artifact and credential presence without running inference.
/// Always 200; `status` is `degraded` unless both artifacts loaded and agree.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let models = &state.models;
    let status = if models.is_ready() {
        "healthy"
    } else {
        "degraded"
    };

    let api_key = if state.llm.has_credential() {
        "present"
    } else {
        "missing"
    };

    Json(json!({
        "status": status,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "vectorizer": loaded(models.vectorizer_loaded()),
        "model": loaded(models.classifier_loaded()),
        "api_key": api_key,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
