//! Maps the error taxonomy onto HTTP responses. Internal detail is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medchat_core::MedchatError;

pub(crate) struct ApiError(pub(crate) MedchatError);

impl From<MedchatError> for ApiError {
    fn from(e: MedchatError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MedchatError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MedchatError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            other => {
                tracing::error!(target: "medchat::gateway", error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Decodes a raw JSON body. Empty or malformed bodies are client errors.
pub(crate) fn parse_json_body(body: &[u8]) -> Result<serde_json::Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(MedchatError::validation("No JSON payload provided").into());
    }
    serde_json::from_slice(body)
        .map_err(|e| MedchatError::validation(format!("JSON inválido: {}", e)).into())
}

/// Body for panics caught by the catch-panic layer.
pub(crate) fn panic_response(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!(target: "medchat::gateway", "Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let res = ApiError(MedchatError::Persistence("disk path /secret".into())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(res).await, r#"{"error":"Internal server error"}"#);
    }

    #[tokio::test]
    async fn panics_become_generic_500() {
        let res = panic_response(Box::new("boom at /secret"));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(res).await;
        assert!(!text.contains("/secret"));
        assert_eq!(text, r#"{"error":"Internal server error"}"#);
    }

    #[test]
    fn blank_body_is_a_validation_error() {
        let err = parse_json_body(b"  \n").err().unwrap();
        assert!(matches!(err.0, MedchatError::Validation(_)));
    }
}
