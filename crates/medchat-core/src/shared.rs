//! Shared types used across the medchat crates.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_APP_NAME: &str = "Chatbot médico - base local";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_STORAGE_PATH: &str = "./data";
const DEFAULT_INGEST_KEY: &str = "changeme_ingest_key";
const DEFAULT_LLM_MODE: &str = "auto";
const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 8;
const DEFAULT_LLM_MAX_TOKENS: u32 = 600;
const DEFAULT_LLM_TEMPERATURE: f32 = 0.2;
const DEFAULT_MATCH_LIMIT: usize = 3;

/// Which durable collaborator backs the knowledge store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Sled tree under `<storage_path>/medchat_knowledge`.
    Sled,
    /// Pretty-printed `<storage_path>/symptoms_db.json`.
    Json,
}

/// Global application configuration (gateway + generative capability). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Service identity reported by the status endpoint.
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackendKind,
    /// Base directory for the knowledge store (sled DB or JSON file are derived from this).
    pub storage_path: String,
    /// Shared secret expected in the `X-INGEST-KEY` header.
    pub ingest_key: String,
    /// LLM mode: "auto", "live", "mock" or "off".
    pub llm_mode: String,
    pub llm_api_url: String,
    /// Falls back to `OPENAI_API_KEY` when not configured.
    #[serde(default)]
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
    /// Top-N entries returned by the relevance matcher.
    pub match_limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            storage_backend: StorageBackendKind::Sled,
            storage_path: DEFAULT_STORAGE_PATH.to_string(),
            ingest_key: DEFAULT_INGEST_KEY.to_string(),
            llm_mode: DEFAULT_LLM_MODE.to_string(),
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            llm_max_tokens: DEFAULT_LLM_MAX_TOKENS,
            llm_temperature: DEFAULT_LLM_TEMPERATURE,
            match_limit: DEFAULT_MATCH_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `MEDCHAT__*` > file named by
    /// `MEDCHAT_CONFIG` (default `config/gateway.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("MEDCHAT_CONFIG").unwrap_or_else(|_| "config/gateway.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`CoreConfig::load`] with an explicit file path. A missing file is not an error.
    ///
    /// `OPENAI_MODEL` replaces the built-in model default, so a model named in the file or in
    /// `MEDCHAT__LLM_MODEL` still wins over it.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let model_default = std::env::var("OPENAI_MODEL")
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());
        Self::load_layered(path, &model_default)
    }

    fn load_layered(path: &Path, model_default: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("app_name", DEFAULT_APP_NAME)?
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", DEFAULT_PORT as i64)?
            .set_default("storage_backend", "sled")?
            .set_default("storage_path", DEFAULT_STORAGE_PATH)?
            .set_default("ingest_key", DEFAULT_INGEST_KEY)?
            .set_default("llm_mode", DEFAULT_LLM_MODE)?
            .set_default("llm_api_url", DEFAULT_LLM_API_URL)?
            .set_default("llm_model", model_default)?
            .set_default("llm_timeout_secs", DEFAULT_LLM_TIMEOUT_SECS as i64)?
            .set_default("llm_max_tokens", DEFAULT_LLM_MAX_TOKENS as i64)?
            .set_default("llm_temperature", DEFAULT_LLM_TEMPERATURE as f64)?
            .set_default("match_limit", DEFAULT_MATCH_LIMIT as i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("MEDCHAT").separator("__"))
            .build()?;

        let mut cfg: Self = built.try_deserialize()?;
        if cfg.llm_api_key.as_deref().map_or(true, str::is_empty) {
            cfg.llm_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        Ok(cfg)
    }

    /// Path of the sled knowledge DB.
    pub fn sled_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("medchat_knowledge")
    }

    /// Path of the JSON knowledge file.
    pub fn json_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("symptoms_db.json")
    }

    /// True when an API key is available for the live generative capability.
    pub fn has_llm_key(&self) -> bool {
        self.llm_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Free-form caller data (age, history, ...). Passed verbatim to the generative prompt,
/// keys in caller order, and never interpreted by the matcher or the composer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientContext(pub serde_json::Map<String, serde_json::Value>);

impl PatientContext {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON for prompt embedding. Non-ASCII text is kept as is.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Which strategy produced a composed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Generative,
    RuleBased,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Generative => "generative",
            ResponseSource::RuleBased => "rule_based",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CoreConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.app_name, DEFAULT_APP_NAME);
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.storage_backend, StorageBackendKind::Sled);
        assert_eq!(cfg.match_limit, 3);
        assert_eq!(cfg.llm_max_tokens, 600);
    }

    #[test]
    fn load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "app_name = \"Clínica Demo\"\nport = 7070\nstorage_backend = \"json\"\nmatch_limit = 5"
        )
        .unwrap();
        let cfg = CoreConfig::load_from(&path).unwrap();
        assert_eq!(cfg.app_name, "Clínica Demo");
        assert_eq!(cfg.port, 7070);
        assert_eq!(cfg.storage_backend, StorageBackendKind::Json);
        assert_eq!(cfg.match_limit, 5);
        assert_eq!(cfg.json_path(), Path::new("./data").join("symptoms_db.json"));
    }

    #[test]
    fn model_fallback_only_replaces_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let cfg = CoreConfig::load_layered(&absent, "gpt-env-model").unwrap();
        assert_eq!(cfg.llm_model, "gpt-env-model");

        let path = dir.path().join("gateway.toml");
        std::fs::write(&path, "llm_model = \"modelo-del-archivo\"\n").unwrap();
        let cfg = CoreConfig::load_layered(&path, "gpt-env-model").unwrap();
        assert_eq!(cfg.llm_model, "modelo-del-archivo");
    }

    #[test]
    fn unknown_storage_backend_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(&path, "storage_backend = \"postgres\"\n").unwrap();
        assert!(CoreConfig::load_from(&path).is_err());
    }

    #[test]
    fn patient_context_serializes_without_escaping_accents() {
        let ctx: PatientContext =
            serde_json::from_str(r#"{"edad": 54, "antecedentes": "hipertensión"}"#).unwrap();
        assert!(!ctx.is_empty());
        assert!(ctx.to_prompt_json().contains("hipertensión"));
        assert!(PatientContext::default().is_empty());
        assert_eq!(PatientContext::default().to_prompt_json(), "{}");
    }

    #[test]
    fn patient_context_keeps_caller_key_order() {
        let raw = r#"{"sexo":"F","edad":54,"antecedentes":"ninguno"}"#;
        let ctx: PatientContext = serde_json::from_str(raw).unwrap();
        assert_eq!(ctx.to_prompt_json(), raw);
    }

    #[test]
    fn response_source_wire_names() {
        assert_eq!(
            serde_json::to_value(ResponseSource::RuleBased).unwrap(),
            serde_json::json!("rule_based")
        );
        assert_eq!(ResponseSource::Generative.as_str(), "generative");
    }
}
