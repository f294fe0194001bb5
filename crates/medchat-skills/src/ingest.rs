//! Ingest: validates an identifier→entry payload and upserts it into the knowledge store.

use medchat_core::{KnowledgeEntry, KnowledgeMap, KnowledgeStore, MedchatError, Result};
use serde_json::Value;

const INVALID_PAYLOAD: &str = "Payload inválido; se espera un dict JSON con clave -> entry.";

/// Parses a JSON mapping into entries. Non-object payloads, empty mappings, blank
/// identifiers and non-object entries are validation errors.
pub fn parse_ingest_payload(payload: Value) -> Result<KnowledgeMap> {
    let Value::Object(map) = payload else {
        return Err(MedchatError::validation(INVALID_PAYLOAD));
    };
    if map.is_empty() {
        return Err(MedchatError::validation(INVALID_PAYLOAD));
    }

    let mut entries = KnowledgeMap::new();
    for (id, value) in map {
        if id.trim().is_empty() {
            return Err(MedchatError::validation(
                "Payload inválido; los identificadores no pueden estar vacíos.",
            ));
        }
        if !value.is_object() {
            return Err(MedchatError::validation(format!(
                "Payload inválido; la entrada '{}' debe ser un objeto JSON.",
                id
            )));
        }
        let entry: KnowledgeEntry = serde_json::from_value(value).map_err(|e| {
            MedchatError::validation(format!("Payload inválido; la entrada '{}' no es válida: {}", id, e))
        })?;
        entries.insert(id, entry);
    }
    Ok(entries)
}

/// Validates and merges `payload`; returns the updated identifiers.
pub fn ingest_entries(store: &KnowledgeStore, payload: Value) -> Result<Vec<String>> {
    let entries = match parse_ingest_payload(payload) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(target: "medchat::ingest", error = %e, "Ingest payload rejected");
            return Err(e);
        }
    };
    let keys = store.merge(entries)?;
    tracing::info!(
        target: "medchat::ingest",
        updated = keys.len(),
        keys = ?keys,
        "Ingest applied"
    );
    Ok(keys)
}
