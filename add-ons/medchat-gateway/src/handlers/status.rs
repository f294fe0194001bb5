use crate::AppState;
use axum::extract::State;
use axum::Json;
use chrono::{SecondsFormat, Utc};

/// GET /: service identity and current UTC time. No side effects.
pub(crate) async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": state.config.app_name,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    }))
}

/// GET /api/v1/health: liveness check.
pub(crate) async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/kb-status: store status plus the resolved generative mode.
pub(crate) async fn kb_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "knowledge": state.pipeline.store().status(),
        "llm_mode": state.llm_mode.to_string(),
        "generative_available": state.pipeline.generative_available(),
    }))
}
