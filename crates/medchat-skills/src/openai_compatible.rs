//! OpenAI-compatible chat-completions client used as the live generative capability.
//!
//! Works against any endpoint exposing `POST {base}/chat/completions` with bearer auth.

use crate::model_router::{CapabilityError, LanguageModel};
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAiChatModel {
    /// Base URL (e.g. "https://api.openai.com/v1").
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CapabilityError::Unavailable(format!("http client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.to_string(),
            client,
        })
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str, max_tokens: u32, temperature: f32) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        })
    }
}

/// Pulls `choices[0].message.content`, trimmed. Empty or missing content is malformed.
pub(crate) fn extract_content(json: &Value) -> Result<String, CapabilityError> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| CapabilityError::Malformed("no choices in response".into()))?;
    let content = choice["message"]["content"]
        .as_str()
        .map(str::trim)
        .unwrap_or("");
    if content.is_empty() {
        return Err(CapabilityError::Malformed("empty message content".into()));
    }
    Ok(content.to_string())
}

#[async_trait::async_trait]
impl LanguageModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, CapabilityError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(system_prompt, user_prompt, max_output_tokens, temperature);

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| CapabilityError::Transport(format!("{} connection failed: {}", url, e)))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CapabilityError::Status { status, body });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| CapabilityError::Malformed(e.to_string()))?;
        extract_content(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trimmed_content() {
        let json = json!({ "choices": [{ "message": { "content": "  Hola.\n" } }] });
        assert_eq!(extract_content(&json).unwrap(), "Hola.");
    }

    #[test]
    fn missing_choices_is_malformed() {
        assert!(matches!(
            extract_content(&json!({ "error": "x" })),
            Err(CapabilityError::Malformed(_))
        ));
        assert!(matches!(
            extract_content(&json!({ "choices": [{ "message": { "content": "   " } }] })),
            Err(CapabilityError::Malformed(_))
        ));
    }

    #[test]
    fn request_body_carries_bounds_and_both_roles() {
        let model = OpenAiChatModel::new(
            "https://api.example.com/v1/",
            "sk-test",
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(model.base_url, "https://api.example.com/v1");
        let body = model.request_body("sys", "user", 600, 0.2);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 600);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let model = OpenAiChatModel::new(
            "http://127.0.0.1:9/v1",
            "sk-test",
            "gpt-4o-mini",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = model.complete("sys", "user", 10, 0.2).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Transport(_)));
    }
}
