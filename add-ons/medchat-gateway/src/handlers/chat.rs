//! Chat handler: validates the body and runs the pipeline (match → context → compose).

use crate::error::{parse_json_body, ApiError};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use medchat_skills::{ChatRequest, ComposedResponse};

/// POST /chat: `{message, patient_info?}` → `{response, source, matched_entries}`.
pub(crate) async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ComposedResponse>, ApiError> {
    let payload = parse_json_body(&body)?;
    let request = ChatRequest::from_json(payload)?;
    let response = state.pipeline.answer(&request).await;
    Ok(Json(response))
}
