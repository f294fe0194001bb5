//! Durable collaborators for the knowledge store.

use super::store::{KnowledgeEntry, KnowledgeMap};
use super::KnowledgeBackend;
use crate::error::{MedchatError, Result};
use sled::Db;
use std::path::{Path, PathBuf};

const TREE_NAME: &str = "symptom_entries";

/// Sled-backed persistence: one tree, JSON-encoded entries keyed by identifier.
pub struct SledBackend {
    db: Db,
    path: PathBuf,
}

impl SledBackend {
    /// Opens or creates the knowledge DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl KnowledgeBackend for SledBackend {
    fn load(&self) -> Result<Option<KnowledgeMap>> {
        let tree = self.db.open_tree(TREE_NAME)?;
        if tree.is_empty() {
            return Ok(None);
        }
        let mut entries = KnowledgeMap::new();
        for item in tree.iter() {
            let (k, v) = item?;
            let id = String::from_utf8(k.to_vec())
                .map_err(|e| MedchatError::Persistence(format!("non UTF-8 key: {}", e)))?;
            let entry: KnowledgeEntry = serde_json::from_slice(&v)?;
            entries.insert(id, entry);
        }
        Ok(Some(entries))
    }

    /// Applies the full mapping as one atomic batch (stale keys removed), then flushes.
    fn save(&self, entries: &KnowledgeMap) -> Result<()> {
        let tree = self.db.open_tree(TREE_NAME)?;
        let mut batch = sled::Batch::default();
        for key in tree.iter().keys() {
            let key = key?;
            let stale = std::str::from_utf8(&key).map_or(true, |id| !entries.contains_key(id));
            if stale {
                batch.remove(key);
            }
        }
        for (id, entry) in entries {
            batch.insert(id.as_bytes(), serde_json::to_vec(entry)?);
        }
        tree.apply_batch(batch)?;
        tree.flush()?;
        tracing::debug!(
            target: "medchat::knowledge",
            path = %self.path.display(),
            entries = entries.len(),
            "sled: knowledge tree saved"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sled:{}", self.path.display())
    }
}

/// JSON-file persistence in the `symptoms_db.json` layout (pretty-printed object).
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "symptoms_db.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KnowledgeBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<KnowledgeMap>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let entries: KnowledgeMap = serde_json::from_str(&raw)?;
        Ok(Some(entries))
    }

    /// Writes to a sibling temp file and renames it over the target so readers of the
    /// file never see a truncated document.
    fn save(&self, entries: &KnowledgeMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        let body = serde_json::to_string_pretty(entries)?;
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(
            target: "medchat::knowledge",
            path = %self.path.display(),
            entries = entries.len(),
            "json: knowledge file saved"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}
