//! medchat-core: shared types, configuration, error taxonomy, and the symptom knowledge store.
//!
//! The skills crate (matcher, composer) and the gateway both build on the types
//! re-exported here so the HTTP layer never reaches into storage details.

mod error;
mod knowledge;
mod shared;

pub use error::{MedchatError, Result};

pub use shared::{CoreConfig, PatientContext, ResponseSource, StorageBackendKind};

pub use knowledge::{
    starter_entries, JsonFileBackend, KnowledgeBackend, KnowledgeEntry, KnowledgeMap,
    KnowledgeStore, SledBackend, StoreStatus,
};
