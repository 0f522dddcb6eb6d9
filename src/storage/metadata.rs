//! Manifest describing the persisted corpus.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::{IndexError, StoreError, StoreResult};

/// Manifest file name inside the data directory.
pub const MANIFEST_FILE: &str = "corpus.meta";

/// Summary of the corpus state, written on every flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusManifest {
    /// Version of the on-disk layout
    pub version: u32,

    /// Dimension of every stored vector
    pub dimension: usize,

    /// Embedding model that produced the vectors
    pub model: String,

    /// Number of rows in the index (and metadata store)
    pub rows: usize,

    /// Number of distinct documents
    pub documents: usize,

    /// Last modification timestamp
    pub last_modified: u64,
}

impl CorpusManifest {
    /// Create a manifest for a fresh corpus
    pub fn new(dimension: usize, model: impl Into<String>) -> Self {
        Self {
            version: 1,
            dimension,
            model: model.into(),
            rows: 0,
            documents: 0,
            last_modified: crate::utils::get_utc_timestamp(),
        }
    }

    /// Update counts after an ingest
    pub fn update_counts(&mut self, rows: usize, documents: usize) {
        self.rows = rows;
        self.documents = documents;
        self.last_modified = crate::utils::get_utc_timestamp();
    }

    /// Check that persisted vectors are usable with the current generator.
    ///
    /// A dimension change is fatal. A model change with the same dimension only
    /// warns: the vectors still fit the index but may no longer be comparable.
    pub fn check_compatible(&self, dimension: usize, model: &str) -> StoreResult<()> {
        if self.dimension != dimension {
            return Err(StoreError::Index(IndexError::DimensionMismatch {
                expected: dimension,
                actual: self.dimension,
            }));
        }
        if self.model != model {
            tracing::warn!(
                target: "session",
                "corpus was embedded with {} but the configured model is {model}; \
                 re-ingest to keep distances meaningful",
                self.model
            );
        }
        Ok(())
    }

    /// Save manifest to the data directory
    pub fn save(&self, base_path: &Path) -> StoreResult<()> {
        let path = base_path.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Manifest(format!("Failed to serialize manifest: {e}")))?;

        crate::utils::write_atomic(&path, json.as_bytes())
            .map_err(|e| StoreError::Manifest(format!("Failed to write {}: {e}", path.display())))
    }

    /// Load manifest from the data directory, `None` if there is none yet
    pub fn load(base_path: &Path) -> StoreResult<Option<Self>> {
        let path = base_path.join(MANIFEST_FILE);

        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .map_err(|e| StoreError::Manifest(format!("Failed to read {}: {e}", path.display())))?;

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Manifest(format!("Failed to parse manifest: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = CorpusManifest::new(384, "AllMiniLML6V2");
        manifest.update_counts(12, 3);
        manifest.save(temp_dir.path()).unwrap();

        let loaded = CorpusManifest::load(temp_dir.path()).unwrap().unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        assert!(CorpusManifest::load(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_compatibility() {
        let manifest = CorpusManifest::new(384, "AllMiniLML6V2");
        assert!(manifest.check_compatible(384, "AllMiniLML6V2").is_ok());
        // model drift only warns
        assert!(manifest.check_compatible(384, "ParaphraseMLMiniLML12V2").is_ok());
        assert!(manifest.check_compatible(768, "BGEBaseENV15").is_err());
    }
}
