//! Process-wide corpus shared by ingestion and query callers.

use parking_lot::RwLock;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::ingest::{IngestProgress, IngestStats, IngestionPipeline, NoProgress};
use super::query::{QueryHit, QueryPipeline};
use super::{PipelineError, PipelineResult};
use crate::config::{ConfigError, Settings};
use crate::documents::{Document, DocumentSource, TextTokenizer, WindowChunker};
use crate::semantic::{EmbeddingBatcher, EmbeddingGenerator};
use crate::storage::{Corpus, CorpusPersistence, IndexError, StoreError};

/// Snapshot of the corpus for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub rows: usize,
    pub documents: usize,
    pub dimension: usize,
    pub model: String,
    pub data_dir: PathBuf,
}

/// Loaded corpus plus the pipelines that read and extend it.
///
/// The index and metadata store sit behind one lock. Ingestion chunks and
/// embeds without holding it, then takes the write lock only for the append.
/// Queries share the read lock. Nothing is written to disk until
/// [`flush`](Self::flush).
pub struct RagSession {
    corpus: RwLock<Corpus>,
    ingestion: IngestionPipeline,
    query: QueryPipeline,
    persistence: CorpusPersistence,
    model_name: String,
    default_k: usize,
}

impl std::fmt::Debug for RagSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagSession")
            .field("rows", &self.corpus.read().len())
            .field("model", &self.model_name)
            .field("data_dir", &self.persistence.base_path())
            .finish()
    }
}

impl RagSession {
    /// Build the session from settings, loading the embedding model and tokenizer they name.
    pub fn from_settings(settings: &Settings) -> PipelineResult<Self> {
        settings.validate()?;
        let tokenizer: Arc<dyn TextTokenizer> =
            Arc::from(crate::documents::tokenizer::from_settings(&settings.tokenizer)?);
        let generator = crate::semantic::from_settings(&settings.embedding)?;
        Self::open(settings, generator, tokenizer)
    }

    /// Validate configuration and load persisted state.
    ///
    /// Every dimension mismatch between the configuration, the generator and
    /// the persisted index is reported here rather than on first use.
    pub fn open(
        settings: &Settings,
        generator: Arc<dyn EmbeddingGenerator>,
        tokenizer: Arc<dyn TextTokenizer>,
    ) -> PipelineResult<Self> {
        settings.validate()?;
        let dimension = settings.embedding.dimension;
        if generator.dimension() != dimension {
            return Err(ConfigError::DimensionMismatch {
                context: format!("embedding model {}", generator.model_name()),
                expected: dimension,
                actual: generator.dimension(),
            }
            .into());
        }

        let persistence = CorpusPersistence::new(&settings.data_dir);
        let corpus = Self::load_corpus(&persistence, dimension, generator.model_name())?;

        let chunker = WindowChunker::new(tokenizer, settings.chunking)?;
        let batcher = Arc::new(
            EmbeddingBatcher::new(generator.clone(), settings.embedding.batch_size)?
                .with_parallel(settings.embedding.parallel),
        );

        tracing::info!(
            target: "session",
            "session ready: {} rows, dimension {dimension}, chunk_size {}, overlap {}",
            corpus.len(),
            settings.chunking.chunk_size,
            settings.chunking.overlap
        );

        Ok(Self {
            corpus: RwLock::new(corpus),
            ingestion: IngestionPipeline::new(Arc::new(chunker), batcher.clone()),
            query: QueryPipeline::new(batcher),
            persistence,
            model_name: generator.model_name().to_string(),
            default_k: settings.query.default_k,
        })
    }

    fn load_corpus(
        persistence: &CorpusPersistence,
        dimension: usize,
        model: &str,
    ) -> PipelineResult<Corpus> {
        if let Some(manifest) = persistence.load_manifest()? {
            manifest
                .check_compatible(dimension, model)
                .map_err(|e| persisted_dimension_error(e, persistence))?;
        }
        persistence
            .load(dimension)
            .map_err(|e| persisted_dimension_error(e, persistence))
    }

    /// Ingest documents and append them to the corpus.
    pub fn ingest(&self, documents: &[Document]) -> PipelineResult<IngestStats> {
        self.ingest_with_progress(documents, &mut NoProgress)
    }

    pub fn ingest_with_progress(
        &self,
        documents: &[Document],
        progress: &mut dyn IngestProgress,
    ) -> PipelineResult<IngestStats> {
        let batch = self.ingestion.prepare(documents, progress)?;
        if batch.is_empty() {
            return Ok(batch.stats());
        }

        let mut corpus = self.corpus.write();
        let stats = batch.commit(&mut *corpus)?;
        tracing::info!(
            target: "session",
            "ingested {} chunks, corpus now {} rows",
            stats.chunks_created,
            corpus.len()
        );
        Ok(stats)
    }

    /// Fetch everything from a source and ingest it in one call.
    pub fn ingest_source(
        &self,
        source: &dyn DocumentSource,
        progress: &mut dyn IngestProgress,
    ) -> PipelineResult<IngestStats> {
        tracing::info!(target: "session", "fetching from {}", source.describe());
        let documents = source.fetch()?;
        self.ingest_with_progress(&documents, progress)
    }

    /// Nearest chunks for `text`. `None` uses the configured default k.
    pub fn query(&self, text: &str, k: Option<usize>) -> PipelineResult<Vec<QueryHit>> {
        let k = k.unwrap_or(self.default_k);
        let corpus = self.corpus.read();
        self.query.query(&*corpus, text, k)
    }

    /// Write index, metadata and manifest to the data directory.
    pub fn flush(&self) -> PipelineResult<()> {
        let corpus = self.corpus.read();
        self.persistence.save(&*corpus, &self.model_name)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.corpus.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.read().is_empty()
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub fn stats(&self) -> CorpusStats {
        let corpus = self.corpus.read();
        CorpusStats {
            rows: corpus.len(),
            documents: corpus.metadata().document_count(),
            dimension: corpus.dimension(),
            model: self.model_name.clone(),
            data_dir: self.persistence.base_path().to_path_buf(),
        }
    }
}

/// A persisted index of the wrong dimension is a configuration problem.
fn persisted_dimension_error(error: StoreError, persistence: &CorpusPersistence) -> PipelineError {
    match error {
        StoreError::Index(IndexError::DimensionMismatch { expected, actual }) => {
            ConfigError::DimensionMismatch {
                context: format!("persisted index in {}", persistence.base_path().display()),
                expected,
                actual,
            }
            .into()
        }
        other => other.into(),
    }
}
