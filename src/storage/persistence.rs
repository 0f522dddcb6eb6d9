//! Persistence of the corpus pair and its manifest.
//!
//! The data directory holds three files: the vector index blob, the metadata
//! records and the manifest. Both corpus files are staged and synced before
//! either replaces its predecessor; on load their row counts must agree.

use std::path::{Path, PathBuf};

use super::corpus::Corpus;
use super::error::{IndexError, MetadataError, StoreError, StoreResult};
use super::metadata::{CorpusManifest, MANIFEST_FILE};
use super::metadata_store::MetadataStore;
use super::vector_index::{FlatL2Index, VectorIndex};
use crate::utils::{persist_staged, stage_file};

pub const INDEX_FILE: &str = "vectors.idx";
pub const METADATA_FILE: &str = "metadata.json";

/// Manages persistence of the corpus
#[derive(Debug, Clone)]
pub struct CorpusPersistence {
    base_path: PathBuf,
}

impl CorpusPersistence {
    /// Create a new persistence manager
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn index_path(&self) -> PathBuf {
        self.base_path.join(INDEX_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.base_path.join(METADATA_FILE)
    }

    /// Load the corpus, or an empty one on first run.
    ///
    /// Either file may be absent (it loads empty), but a pair whose row counts
    /// disagree is refused rather than repaired.
    pub fn load(&self, dimension: usize) -> StoreResult<Corpus> {
        let index = FlatL2Index::load(&self.index_path(), dimension)?;
        let metadata = MetadataStore::load(&self.metadata_path())?;

        let corpus = Corpus::from_parts(index, metadata).inspect_err(|e| {
            tracing::error!(target: "session", "refusing to load {}: {e}", self.base_path.display());
        })?;

        tracing::info!(
            target: "session",
            "loaded corpus from {}: {} rows",
            self.base_path.display(),
            corpus.len()
        );
        Ok(corpus)
    }

    /// Load the manifest, if one has been written.
    pub fn load_manifest(&self) -> StoreResult<Option<CorpusManifest>> {
        CorpusManifest::load(&self.base_path)
    }

    /// Write index, metadata and manifest.
    ///
    /// A failure while staging leaves the previous files in place. Only a
    /// failure between the two renames can leave the pair out of step, and
    /// that is refused at load.
    pub fn save<I: VectorIndex>(&self, corpus: &Corpus<I>, model: &str) -> StoreResult<()> {
        let index_path = self.index_path();
        let metadata_path = self.metadata_path();
        let index_write_error = |source| IndexError::FileWrite {
            path: index_path.clone(),
            source,
        };
        let metadata_write_error = |source| MetadataError::FileWrite {
            path: metadata_path.clone(),
            source,
        };

        let staged_index = stage_file(&index_path, &corpus.index().to_bytes())
            .map_err(index_write_error)?;
        let staged_metadata = stage_file(&metadata_path, &corpus.metadata().to_json()?)
            .map_err(metadata_write_error)?;

        persist_staged(staged_metadata, &metadata_path).map_err(metadata_write_error)?;
        persist_staged(staged_index, &index_path).map_err(index_write_error)?;

        let mut manifest = CorpusManifest::new(corpus.dimension(), model);
        manifest.update_counts(corpus.len(), corpus.metadata().document_count());
        manifest.save(&self.base_path)?;

        tracing::info!(
            target: "session",
            "flushed {} rows to {}",
            corpus.len(),
            self.base_path.display()
        );
        Ok(())
    }

    /// Check if anything has been persisted
    pub fn exists(&self) -> bool {
        self.index_path().exists() || self.metadata_path().exists()
    }

    /// Delete the persisted corpus
    pub fn clear(&self) -> StoreResult<()> {
        for name in [INDEX_FILE, METADATA_FILE, MANIFEST_FILE] {
            let path = self.base_path.join(name);
            if path.exists() {
                std::fs::remove_file(&path).map_err(|source| {
                    StoreError::Index(IndexError::FileWrite { path, source })
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{Chunk, Document, TextWindow};
    use crate::storage::metadata_store::MetadataRecord;
    use tempfile::TempDir;

    fn sample_corpus() -> Corpus {
        let doc = Document::new("d1", Some("d1.txt".to_string()), None, "");
        let records = (0..3)
            .map(|i| {
                let window = TextWindow {
                    text: format!("w{i}"),
                    start_token: i * 3,
                    end_token: i * 3 + 4,
                };
                MetadataRecord::from_chunk(Chunk::from_window("d1", i, window), &doc)
            })
            .collect();
        let mut corpus = Corpus::new(3);
        corpus
            .append_aligned(
                &[vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]],
                records,
            )
            .unwrap();
        corpus
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = CorpusPersistence::new(temp_dir.path());
        assert!(!persistence.exists());

        let corpus = sample_corpus();
        persistence.save(&corpus, "stub").unwrap();
        assert!(persistence.exists());

        let loaded = persistence.load(3).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.metadata(), corpus.metadata());

        let probe = [0.1, 0.9, 0.0];
        assert_eq!(
            loaded.index().search(&probe, 3).unwrap(),
            corpus.index().search(&probe, 3).unwrap()
        );

        let manifest = persistence.load_manifest().unwrap().unwrap();
        assert_eq!(manifest.rows, 3);
        assert_eq!(manifest.documents, 1);
        assert_eq!(manifest.model, "stub");
    }

    #[test]
    fn test_first_run_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = CorpusPersistence::new(temp_dir.path().join("fresh"))
            .load(4)
            .unwrap();
        assert!(corpus.is_empty());
        assert_eq!(corpus.dimension(), 4);
    }

    #[test]
    fn test_misaligned_files_refused() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = CorpusPersistence::new(temp_dir.path());
        persistence.save(&sample_corpus(), "stub").unwrap();

        // metadata from an older, shorter flush
        MetadataStore::new()
            .save(&persistence.metadata_path())
            .unwrap();

        let err = persistence.load(3).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Misaligned {
                vectors: 3,
                records: 0
            }
        ));
    }

    #[test]
    fn test_failed_metadata_write_keeps_previous_index() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = CorpusPersistence::new(temp_dir.path());
        let corpus = sample_corpus();
        persistence.save(&corpus, "stub").unwrap();
        let index_before = std::fs::read(persistence.index_path()).unwrap();

        let mut grown = sample_corpus();
        let extra = grown.metadata().records()[0].clone();
        grown
            .append_aligned(&[vec![1.0, 1.0, 1.0]], vec![extra])
            .unwrap();

        // a directory in the metadata slot makes the rename fail
        std::fs::remove_file(persistence.metadata_path()).unwrap();
        std::fs::create_dir(persistence.metadata_path()).unwrap();

        let err = persistence.save(&grown, "stub").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Metadata(MetadataError::FileWrite { .. })
        ));
        assert_eq!(std::fs::read(persistence.index_path()).unwrap(), index_before);
        assert_eq!(persistence.load_manifest().unwrap().unwrap().rows, 3);
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = CorpusPersistence::new(temp_dir.path());
        persistence.save(&sample_corpus(), "stub").unwrap();

        persistence.clear().unwrap();
        assert!(!persistence.exists());
        assert!(persistence.load_manifest().unwrap().is_none());
    }
}
