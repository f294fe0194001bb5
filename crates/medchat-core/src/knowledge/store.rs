//! In-memory knowledge store with snapshot reads and atomic bulk merges.

use super::backend::{JsonFileBackend, SledBackend};
use super::bootstrap::starter_entries;
use super::KnowledgeBackend;
use crate::error::{MedchatError, Result};
use crate::shared::{CoreConfig, StorageBackendKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

/// Identifier → entry. Iteration order is identifier order.
pub type KnowledgeMap = BTreeMap<String, KnowledgeEntry>;

/// One structured record describing a condition and its associated symptoms.
///
/// Every field defaults to empty so partially-filled ingest payloads are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ordered; duplicates permitted.
    #[serde(default)]
    pub common_symptoms: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl KnowledgeEntry {
    pub fn new<S, I>(
        title: impl Into<String>,
        description: impl Into<String>,
        symptoms: I,
        notes: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            description: description.into(),
            common_symptoms: symptoms.into_iter().map(Into::into).collect(),
            notes: notes.into(),
        }
    }

    pub fn has_symptoms(&self) -> bool {
        !self.common_symptoms.is_empty()
    }
}

/// Status snapshot for the kb-status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub backend: String,
    pub entry_count: usize,
}

/// Shared knowledge base. Readers take an `Arc` snapshot; a merge builds a new map,
/// persists it, and only then publishes it, so no reader observes a partial merge.
pub struct KnowledgeStore {
    backend: Box<dyn KnowledgeBackend>,
    entries: RwLock<Arc<KnowledgeMap>>,
    /// Serializes writers across the persist-then-publish sequence.
    write_guard: Mutex<()>,
}

impl KnowledgeStore {
    /// Loads the store from `backend`, seeding and persisting the starter set when nothing
    /// has been persisted yet. A persisted empty mapping stays empty.
    pub fn open(backend: Box<dyn KnowledgeBackend>) -> Result<Self> {
        let entries = match backend.load()? {
            Some(entries) => {
                tracing::info!(
                    target: "medchat::knowledge",
                    backend = %backend.describe(),
                    entries = entries.len(),
                    "Knowledge store loaded ({} entries)",
                    entries.len()
                );
                entries
            }
            None => {
                let seed = starter_entries();
                backend.save(&seed)?;
                tracing::info!(
                    target: "medchat::knowledge",
                    backend = %backend.describe(),
                    entries = seed.len(),
                    "No persisted knowledge found; seeded starter entries"
                );
                seed
            }
        };
        Ok(Self {
            backend,
            entries: RwLock::new(Arc::new(entries)),
            write_guard: Mutex::new(()),
        })
    }

    /// Opens a sled-backed store at the given path.
    pub fn open_sled<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::open(Box::new(SledBackend::open_path(path)?))
    }

    /// Opens a JSON-file-backed store at the given path.
    pub fn open_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::open(Box::new(JsonFileBackend::new(path)))
    }

    /// Opens the backend selected by `storage_backend` under `storage_path`.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        match config.storage_backend {
            StorageBackendKind::Sled => Self::open_sled(config.sled_path()),
            StorageBackendKind::Json => Self::open_json(config.json_path()),
        }
    }

    /// Consistent read-only view of every entry.
    pub fn snapshot(&self) -> Arc<KnowledgeMap> {
        match self.entries.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn get(&self, id: &str) -> Option<KnowledgeEntry> {
        self.snapshot().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Upserts `updates` as a whole: existing identifiers are fully replaced, new ones added.
    /// Returns the updated identifiers. When persistence fails the previous state stays visible.
    pub fn merge(&self, updates: KnowledgeMap) -> Result<Vec<String>> {
        let _writer = self
            .write_guard
            .lock()
            .map_err(|_| MedchatError::Persistence("knowledge writer lock poisoned".into()))?;

        let current = self.snapshot();
        let mut next: KnowledgeMap = (*current).clone();
        let mut inserted = 0usize;
        let updated_keys: Vec<String> = updates.keys().cloned().collect();
        for (id, entry) in updates {
            if next.insert(id, entry).is_none() {
                inserted += 1;
            }
        }

        self.backend.save(&next)?;

        let mut slot = self
            .entries
            .write()
            .map_err(|_| MedchatError::Persistence("knowledge store lock poisoned".into()))?;
        *slot = Arc::new(next);

        tracing::info!(
            target: "medchat::knowledge",
            inserted,
            replaced = updated_keys.len() - inserted,
            "Merged {} entries into knowledge store",
            updated_keys.len()
        );
        Ok(updated_keys)
    }

    pub fn status(&self) -> StoreStatus {
        StoreStatus {
            backend: self.backend.describe(),
            entry_count: self.len(),
        }
    }
}
