//! Response Composer: disclaimer + generative text, or disclaimer + rule-based template.
//!
//! The primary strategy is picked once at startup. The generative strategy is attempted at
//! most once per request; on any failure the rule-based template answers instead, so
//! `compose` always produces a response.

use crate::model_router::{CapabilityError, LanguageModel, ModelRouter};
use medchat_core::{CoreConfig, PatientContext, ResponseSource};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Prepended to every response regardless of strategy.
pub const DISCLAIMER: &str = "Nota: soy un asistente informativo y no un sustituto de un profesional médico. \
Si tienes una emergencia, busca atención médica inmediata o llama a los servicios de emergencia locales.\n\n";

const SYSTEM_PROMPT: &str = "Eres un asistente médico empático y claro. Proporciona información general basada en los datos entregados, \
explica síntomas relevantes, sugiere cuándo consultar a un profesional y ofrece pasos prácticos y calmados. \
Nunca des un diagnóstico definitivo; siempre incluye un recordatorio para buscar atención médica.";

const ANSWER_INSTRUCTIONS: &str = "Responde en español con tono empático, claro y práctico. \
Primero resume brevemente la preocupación, luego explica posibles causas o síntomas relacionados, \
y cierra con pasos recomendados y cuándo acudir a urgencias.";

const SUMMARY_HEADER: &str =
    "Resumen: He encontrado la siguiente información que podría estar relacionada con tu mensaje:\n";

const SUGGESTED_STEPS: &str = "Pasos sugeridos:\n\
1) Observa la evolución de los síntomas durante 48-72 horas.\n\
2) Si aparecen signos de alarma (fiebre alta, dificultad para respirar, sangrado abundante, pérdida rápida de peso, dolor intenso), busca atención de urgencias.\n\
3) Programa una consulta con un profesional de la salud para evaluación y pruebas complementarias.\n\
4) Lleva un registro de síntomas: fecha, hora, intensidad y posibles desencadenantes.\n";

const EMPATHETIC_CLOSE: &str = "Si quieres, dime más detalles (edad, cuánto tiempo hace, si tienes antecedentes) \
y te doy una guía más precisa sobre qué preguntar al médico.";

/// Inputs for one composition.
#[derive(Debug, Clone)]
pub struct ComposeRequest<'a> {
    pub message: &'a str,
    pub patient: &'a PatientContext,
    pub context_text: &'a str,
    /// Titles of the matched entries, in rank order.
    pub matched_titles: Vec<String>,
}

/// Final answer plus provenance. Serializes to the chat endpoint's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedResponse {
    #[serde(rename = "response")]
    pub text: String,
    pub source: ResponseSource,
    #[serde(rename = "matched_entries")]
    pub matched_titles: Vec<String>,
}

/// One way of producing the response body (without the disclaimer).
#[async_trait::async_trait]
pub trait ResponseStrategy: Send + Sync {
    fn source(&self) -> ResponseSource;

    async fn respond(&self, req: &ComposeRequest<'_>) -> Result<String, CapabilityError>;
}

/// Generation bounds for the single generative call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            max_tokens: 600,
            temperature: 0.2,
        }
    }
}

impl GenerationSettings {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.llm_timeout_secs.max(1)),
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
        }
    }
}

/// Delegates to a language model with a structured prompt.
pub struct GenerativeStrategy {
    model: Arc<dyn LanguageModel>,
    settings: GenerationSettings,
}

impl GenerativeStrategy {
    pub fn new(model: Arc<dyn LanguageModel>, settings: GenerationSettings) -> Self {
        Self { model, settings }
    }

    pub fn system_prompt() -> &'static str {
        SYSTEM_PROMPT
    }

    pub fn user_prompt(req: &ComposeRequest<'_>) -> String {
        format!(
            "Contexto médico local:\n{}\n\nInformación del paciente: {}\n\nPregunta del paciente: {}\n\n{}",
            req.context_text,
            req.patient.to_prompt_json(),
            req.message,
            ANSWER_INSTRUCTIONS
        )
    }
}

#[async_trait::async_trait]
impl ResponseStrategy for GenerativeStrategy {
    fn source(&self) -> ResponseSource {
        ResponseSource::Generative
    }

    async fn respond(&self, req: &ComposeRequest<'_>) -> Result<String, CapabilityError> {
        let user_prompt = Self::user_prompt(req);
        let call = self.model.complete(
            SYSTEM_PROMPT,
            &user_prompt,
            self.settings.max_tokens,
            self.settings.temperature,
        );
        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(result) => result.map(|text| text.trim().to_string()),
            Err(_) => Err(CapabilityError::Timeout(self.settings.timeout)),
        }
    }
}

/// Deterministic template built from the context text only.
pub struct RuleBasedStrategy;

impl RuleBasedStrategy {
    pub fn render(context_text: &str) -> String {
        format!(
            "{}{}\n{}\n{}",
            SUMMARY_HEADER, context_text, SUGGESTED_STEPS, EMPATHETIC_CLOSE
        )
    }
}

#[async_trait::async_trait]
impl ResponseStrategy for RuleBasedStrategy {
    fn source(&self) -> ResponseSource {
        ResponseSource::RuleBased
    }

    async fn respond(&self, req: &ComposeRequest<'_>) -> Result<String, CapabilityError> {
        Ok(Self::render(req.context_text))
    }
}

/// Holds the strategy chosen at startup. The rule-based template backs it up on failure.
pub struct ResponseComposer {
    primary: Box<dyn ResponseStrategy>,
}

impl ResponseComposer {
    /// Rule-based only.
    pub fn rule_based() -> Self {
        Self {
            primary: Box::new(RuleBasedStrategy),
        }
    }

    pub fn with_generative(model: Arc<dyn LanguageModel>, settings: GenerationSettings) -> Self {
        Self {
            primary: Box::new(GenerativeStrategy::new(model, settings)),
        }
    }

    /// Uses the router's model when one was resolved, rule-based otherwise.
    pub fn from_router(router: &ModelRouter, settings: GenerationSettings) -> Self {
        match router.language_model() {
            Some(model) => Self::with_generative(model, settings),
            None => Self::rule_based(),
        }
    }

    pub fn generative_available(&self) -> bool {
        self.primary.source() == ResponseSource::Generative
    }

    /// Start → try primary → success: done; failure → rule-based → done.
    pub async fn compose(&self, req: ComposeRequest<'_>) -> ComposedResponse {
        let err = match self.primary.respond(&req).await {
            Ok(body) => {
                return ComposedResponse {
                    text: format!("{}{}", DISCLAIMER, body),
                    source: self.primary.source(),
                    matched_titles: req.matched_titles,
                };
            }
            Err(e) => e,
        };
        tracing::warn!(
            target: "medchat::composer",
            error = %err,
            "Generative request failed; falling back to rule-based response"
        );

        ComposedResponse {
            text: format!("{}{}", DISCLAIMER, RuleBasedStrategy::render(req.context_text)),
            source: ResponseSource::RuleBased,
            matched_titles: req.matched_titles,
        }
    }
}
