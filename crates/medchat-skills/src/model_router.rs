//! Model Router: resolves the generative capability once at startup (mock, live, or none).

use crate::openai_compatible::OpenAiChatModel;
use medchat_core::{CoreConfig, MedchatError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a generative call did not produce text. Always recoverable by the caller.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("generative capability unavailable: {0}")]
    Unavailable(String),

    #[error("generative call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<CapabilityError> for MedchatError {
    fn from(e: CapabilityError) -> Self {
        MedchatError::Capability(e.to_string())
    }
}

/// "Given a prompt, return text or fail."
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider/model label for logs.
    fn name(&self) -> &str;

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, CapabilityError>;
}

/// Mode for LLM invocation, from `llm_mode`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    /// Live when an API key is configured, otherwise off.
    #[default]
    Auto,
    Live,
    Mock,
    Off,
}

impl FromStr for LlmMode {
    type Err = MedchatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(LlmMode::Auto),
            "live" => Ok(LlmMode::Live),
            "mock" => Ok(LlmMode::Mock),
            "off" | "none" | "disabled" => Ok(LlmMode::Off),
            other => Err(MedchatError::validation(format!(
                "unknown llm_mode '{}' (expected auto, live, mock or off)",
                other
            ))),
        }
    }
}

impl fmt::Display for LlmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmMode::Auto => "auto",
            LlmMode::Live => "live",
            LlmMode::Mock => "mock",
            LlmMode::Off => "off",
        };
        f.write_str(s)
    }
}

/// Deterministic stand-in for a real model; echoes a preview of the patient question.
pub struct MockLanguageModel;

impl MockLanguageModel {
    fn mock_generate(&self, user_prompt: &str) -> String {
        let question = user_prompt
            .split("Pregunta del paciente:")
            .nth(1)
            .and_then(|s| s.lines().next())
            .map(str::trim)
            .unwrap_or("");
        let mut preview: String = question.chars().take(80).collect();
        if question.chars().count() > 80 {
            preview.push('…');
        }
        format!(
            "[Respuesta generada – modelo simulado]\n\nEntiendo tu preocupación sobre: \"{}\". \
             Con la información disponible no es posible dar un diagnóstico, pero sí orientarte. \
             Te recomiendo consultar con un profesional de la salud y acudir a urgencias si los síntomas empeoran.",
            preview
        )
    }
}

#[async_trait::async_trait]
impl LanguageModel for MockLanguageModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _max_output_tokens: u32,
        _temperature: f32,
    ) -> Result<String, CapabilityError> {
        Ok(self.mock_generate(user_prompt))
    }
}

/// Startup-time choice of generative capability.
pub struct ModelRouter {
    mode: LlmMode,
    model: Option<Arc<dyn LanguageModel>>,
}

impl ModelRouter {
    /// Resolves `llm_mode` against the configured key. `auto` without a key and `off` yield no
    /// model; `live` without a key is a startup error.
    pub fn from_config(config: &CoreConfig) -> Result<Self, MedchatError> {
        let requested: LlmMode = config.llm_mode.parse()?;
        let resolved = match requested {
            LlmMode::Auto if config.has_llm_key() => LlmMode::Live,
            LlmMode::Auto => LlmMode::Off,
            other => other,
        };

        let model: Option<Arc<dyn LanguageModel>> = match resolved {
            LlmMode::Live => {
                let key = config.llm_api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
                    CapabilityError::Unavailable("llm_mode=live requires llm_api_key or OPENAI_API_KEY".into())
                })?;
                Some(Arc::new(OpenAiChatModel::new(
                    &config.llm_api_url,
                    key,
                    &config.llm_model,
                    Duration::from_secs(config.llm_timeout_secs.max(1)),
                )?))
            }
            LlmMode::Mock => Some(Arc::new(MockLanguageModel)),
            LlmMode::Off | LlmMode::Auto => None,
        };

        tracing::info!(
            target: "medchat::model_router",
            requested = %requested,
            mode = %resolved,
            model = model.as_ref().map(|m| m.name()).unwrap_or("none"),
            "Generative capability resolved"
        );
        Ok(Self { mode: resolved, model })
    }

    /// No generative capability: every response is rule-based.
    pub fn disabled() -> Self {
        Self {
            mode: LlmMode::Off,
            model: None,
        }
    }

    /// Injects an arbitrary model (tests, alternative providers).
    pub fn with_model(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            mode: LlmMode::Live,
            model: Some(model),
        }
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }

    pub fn language_model(&self) -> Option<Arc<dyn LanguageModel>> {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_mode_parses_known_values() {
        assert_eq!("auto".parse::<LlmMode>().unwrap(), LlmMode::Auto);
        assert_eq!("LIVE".parse::<LlmMode>().unwrap(), LlmMode::Live);
        assert_eq!("mock".parse::<LlmMode>().unwrap(), LlmMode::Mock);
        assert_eq!("off".parse::<LlmMode>().unwrap(), LlmMode::Off);
        assert!("gpt".parse::<LlmMode>().is_err());
    }

    #[test]
    fn auto_without_key_disables_generation() {
        let config = CoreConfig {
            llm_api_key: None,
            ..CoreConfig::default()
        };
        let router = ModelRouter::from_config(&config).unwrap();
        assert_eq!(router.mode(), LlmMode::Off);
        assert!(router.language_model().is_none());
    }

    #[test]
    fn auto_with_key_goes_live() {
        let config = CoreConfig {
            llm_api_key: Some("sk-test".to_string()),
            ..CoreConfig::default()
        };
        let router = ModelRouter::from_config(&config).unwrap();
        assert_eq!(router.mode(), LlmMode::Live);
        assert_eq!(router.language_model().unwrap().name(), "gpt-4o-mini");
    }

    #[test]
    fn live_without_key_is_an_error() {
        let config = CoreConfig {
            llm_mode: "live".to_string(),
            llm_api_key: None,
            ..CoreConfig::default()
        };
        assert!(matches!(
            ModelRouter::from_config(&config),
            Err(MedchatError::Capability(_))
        ));
    }

    #[tokio::test]
    async fn mock_model_echoes_question_preview() {
        let config = CoreConfig {
            llm_mode: "mock".to_string(),
            ..CoreConfig::default()
        };
        let router = ModelRouter::from_config(&config).unwrap();
        let model = router.language_model().unwrap();
        let text = model
            .complete("sys", "Contexto...\n\nPregunta del paciente: me duele el pecho\n\nResponde", 600, 0.2)
            .await
            .unwrap();
        assert!(text.contains("me duele el pecho"));
        assert!(text.starts_with("[Respuesta generada"));
    }
}
