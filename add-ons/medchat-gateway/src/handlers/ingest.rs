//! Ingest handler: shared-secret protected bulk upsert of knowledge entries.

use crate::error::{parse_json_body, ApiError};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use medchat_core::MedchatError;
use medchat_skills::ingest_entries;
use std::sync::Arc;

pub(crate) const INGEST_KEY_HEADER: &str = "X-INGEST-KEY";

/// Compares without short-circuiting on the first differing byte.
fn secret_matches(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// POST /ingest: mapping identifier → entry; `{status: "ok", updated_keys}`.
pub(crate) async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let provided = headers
        .get(INGEST_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if !secret_matches(provided, state.config.ingest_key.as_bytes()) {
        tracing::warn!(target: "medchat::ingest", "Ingest rejected: bad or missing key");
        return Err(MedchatError::Unauthorized.into());
    }

    let payload = parse_json_body(&body)?;
    // merge persists synchronously (sled flush or file write)
    let store = Arc::clone(state.pipeline.store());
    let updated_keys = tokio::task::spawn_blocking(move || ingest_entries(&store, payload))
        .await
        .map_err(|e| MedchatError::Persistence(format!("ingest task failed: {}", e)))??;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "updated_keys": updated_keys,
    })))
}
