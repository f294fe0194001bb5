//! Chat pipeline: snapshot → match → build context → compose.

use crate::composer::{ComposeRequest, ComposedResponse, ResponseComposer};
use crate::context::build_context;
use crate::matcher::find_relevant_entries;
use medchat_core::{KnowledgeStore, MedchatError, PatientContext, Result};
use serde_json::Value;
use std::sync::Arc;

const NO_PAYLOAD: &str = "No JSON payload provided";
const MESSAGE_REQUIRED: &str = "El campo 'message' es requerido.";

/// A validated chat request. `message` is trimmed and never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub patient_info: PatientContext,
}

impl ChatRequest {
    /// Validates a decoded chat body: `{message: string, patient_info?: object}`.
    pub fn from_json(payload: Value) -> Result<Self> {
        let Value::Object(mut body) = payload else {
            return Err(MedchatError::validation(NO_PAYLOAD));
        };
        if body.is_empty() {
            return Err(MedchatError::validation(NO_PAYLOAD));
        }

        let message = match body.remove("message") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => return Err(MedchatError::validation("El campo 'message' debe ser texto.")),
        };
        if message.is_empty() {
            return Err(MedchatError::validation(MESSAGE_REQUIRED));
        }

        let patient_info = match body.remove("patient_info") {
            None | Some(Value::Null) => PatientContext::default(),
            Some(Value::Object(map)) => PatientContext(map),
            Some(_) => {
                return Err(MedchatError::validation(
                    "El campo 'patient_info' debe ser un objeto JSON.",
                ))
            }
        };

        Ok(Self {
            message,
            patient_info,
        })
    }
}

/// Everything a chat request needs, shared across requests.
pub struct ChatPipeline {
    store: Arc<KnowledgeStore>,
    composer: ResponseComposer,
    match_limit: usize,
}

impl ChatPipeline {
    pub fn new(store: Arc<KnowledgeStore>, composer: ResponseComposer, match_limit: usize) -> Self {
        Self {
            store,
            composer,
            match_limit,
        }
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub fn generative_available(&self) -> bool {
        self.composer.generative_available()
    }

    pub async fn answer(&self, request: &ChatRequest) -> ComposedResponse {
        let request_id = uuid::Uuid::new_v4();
        let entries = self.store.snapshot();
        let matched = find_relevant_entries(&request.message, &entries, self.match_limit);
        let context_text = build_context(&matched);
        let matched_titles: Vec<String> = matched.iter().map(|c| c.entry.title.clone()).collect();

        tracing::info!(
            target: "medchat::chat",
            %request_id,
            message_chars = request.message.chars().count(),
            has_patient_info = !request.patient_info.is_empty(),
            matched = matched.len(),
            "Chat request matched {} entries",
            matched.len()
        );

        let response = self
            .composer
            .compose(ComposeRequest {
                message: &request.message,
                patient: &request.patient_info,
                context_text: &context_text,
                matched_titles,
            })
            .await;

        tracing::info!(
            target: "medchat::chat",
            %request_id,
            source = response.source.as_str(),
            response_chars = response.text.chars().count(),
            "Chat response composed"
        );
        response
    }
}
