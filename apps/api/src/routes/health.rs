use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Characters of the API key echoed back by /check-key.
const KEY_PREFIX_CHARS: usize = 7;

/// GET /
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "ResuMatch backend is running"
    }))
}

/// GET /check-key
/// Reports whether the completion-service key is configured, echoing only a short prefix.
pub async fn check_key_handler(State(state): State<AppState>) -> Json<Value> {
    match state.config.openai_api_key.as_deref() {
        None => Json(json!({
            "status": "missing",
            "message": "OPENAI_API_KEY not found"
        })),
        Some(key) => Json(json!({
            "status": "ok",
            "key_starts_with": format!("{}...", key_prefix(key))
        })),
    }
}

fn key_prefix(key: &str) -> String {
    key.chars().take(KEY_PREFIX_CHARS).collect()
}
