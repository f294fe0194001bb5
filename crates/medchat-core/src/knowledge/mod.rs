//! Symptom knowledge base: structured entries keyed by identifier.
//!
//! The in-memory [`KnowledgeStore`] is the only thing the matcher and the ingest path
//! touch. Durability is delegated to a [`KnowledgeBackend`]:
//!
//! | Backend | Location | Notes |
//! |---------|----------|-------|
//! | [`SledBackend`] | `<storage_path>/medchat_knowledge` | one tree, atomic batch on save |
//! | [`JsonFileBackend`] | `<storage_path>/symptoms_db.json` | temp file + rename on save |

mod backend;
mod bootstrap;
mod store;

pub use backend::{JsonFileBackend, SledBackend};
pub use bootstrap::starter_entries;
pub use store::{KnowledgeEntry, KnowledgeMap, KnowledgeStore, StoreStatus};

use crate::error::Result;

/// Durable collaborator behind the knowledge store.
pub trait KnowledgeBackend: Send + Sync {
    /// Returns the full identifier→entry mapping, or `None` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<KnowledgeMap>>;

    /// Persists the full mapping, overwriting prior content.
    fn save(&self, entries: &KnowledgeMap) -> Result<()>;

    /// Short human-readable description (kind and location) for status output.
    fn describe(&self) -> String;
}
