//! Documents to chunks to vectors to aligned rows.

use std::sync::Arc;

use super::PipelineResult;
use crate::documents::{Chunk, Chunker, Document};
use crate::semantic::EmbeddingBatcher;
use crate::storage::{Corpus, MetadataRecord, StoreResult, VectorIndex};

/// Counts reported by one ingestion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub documents_seen: usize,
    /// Blank documents, contributing no rows.
    pub documents_skipped: usize,
    pub chunks_created: usize,
}

/// Observer for long ingests. Every method has a no-op default.
pub trait IngestProgress {
    /// A document was chunked into `chunks` windows.
    fn on_document(&mut self, _doc_id: &str, _chunks: usize) {}

    /// Embedding has covered `done` of `total` chunk texts.
    fn on_embedded(&mut self, _done: usize, _total: usize) {}
}

/// Progress observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl IngestProgress for NoProgress {}

/// Vectors and records ready to append, in matching order.
#[derive(Debug, Default)]
pub struct PreparedBatch {
    vectors: Vec<Vec<f32>>,
    records: Vec<MetadataRecord>,
    stats: IngestStats,
}

impl PreparedBatch {
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Append both halves to the corpus as one unit.
    pub fn commit<I: VectorIndex>(self, corpus: &mut Corpus<I>) -> StoreResult<IngestStats> {
        corpus.append_aligned(&self.vectors, self.records)?;
        Ok(self.stats)
    }
}

/// Chunks documents and embeds every chunk text in one batched pass.
pub struct IngestionPipeline {
    chunker: Arc<dyn Chunker>,
    batcher: Arc<EmbeddingBatcher>,
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("batcher", &self.batcher)
            .finish_non_exhaustive()
    }
}

impl IngestionPipeline {
    pub fn new(chunker: Arc<dyn Chunker>, batcher: Arc<EmbeddingBatcher>) -> Self {
        Self { chunker, batcher }
    }

    /// Chunk and embed without touching any shared state.
    ///
    /// Blank documents are skipped. All chunk texts of the call are embedded
    /// together, so batch boundaries never follow document boundaries.
    pub fn prepare(
        &self,
        documents: &[Document],
        progress: &mut dyn IngestProgress,
    ) -> PipelineResult<PreparedBatch> {
        let mut stats = IngestStats {
            documents_seen: documents.len(),
            ..IngestStats::default()
        };
        let mut records = Vec::new();

        for document in documents {
            if document.is_blank() {
                tracing::debug!(target: "ingest", "skipping blank document {}", document.id);
                stats.documents_skipped += 1;
                continue;
            }

            let windows = self.chunker.chunk(&document.text)?;
            progress.on_document(&document.id, windows.len());
            records.extend(windows.into_iter().enumerate().map(|(ordinal, window)| {
                MetadataRecord::from_chunk(Chunk::from_window(&document.id, ordinal, window), document)
            }));
        }

        if records.is_empty() {
            tracing::info!(
                target: "ingest",
                "nothing to ingest ({} documents, {} blank)",
                stats.documents_seen,
                stats.documents_skipped
            );
            return Ok(PreparedBatch {
                stats,
                ..PreparedBatch::default()
            });
        }

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let vectors = self
            .batcher
            .embed_with_progress(&texts, |done, total| progress.on_embedded(done, total))?;

        stats.chunks_created = records.len();
        tracing::info!(
            target: "ingest",
            "prepared {} chunks from {} documents ({} blank)",
            stats.chunks_created,
            stats.documents_seen,
            stats.documents_skipped
        );
        Ok(PreparedBatch {
            vectors,
            records,
            stats,
        })
    }

    /// Prepare and append to `corpus`. On error the corpus is unchanged.
    pub fn ingest<I: VectorIndex>(
        &self,
        corpus: &mut Corpus<I>,
        documents: &[Document],
        progress: &mut dyn IngestProgress,
    ) -> PipelineResult<IngestStats> {
        let batch = self.prepare(documents, progress)?;
        Ok(batch.commit(corpus)?)
    }
}
