//! Text query to nearest chunks.

use serde::Serialize;
use std::sync::Arc;

use super::PipelineResult;
use crate::semantic::EmbeddingBatcher;
use crate::storage::{Corpus, MetadataRecord, StoreError, VectorIndex};

/// One retrieved chunk with its squared-L2 distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    #[serde(flatten)]
    pub record: MetadataRecord,
    pub distance: f32,
}

/// Embeds the query text and joins index hits with their metadata.
pub struct QueryPipeline {
    batcher: Arc<EmbeddingBatcher>,
}

impl std::fmt::Debug for QueryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPipeline")
            .field("batcher", &self.batcher)
            .finish()
    }
}

impl QueryPipeline {
    pub fn new(batcher: Arc<EmbeddingBatcher>) -> Self {
        Self { batcher }
    }

    /// The `k` nearest chunks, nearest first. Read-only over `corpus`.
    pub fn query<I: VectorIndex>(
        &self,
        corpus: &Corpus<I>,
        text: &str,
        k: usize,
    ) -> PipelineResult<Vec<QueryHit>> {
        if corpus.metadata().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.batcher.embed_one(text)?;
        self.query_vector(corpus, &vector, k)
    }

    /// Same as [`query`](Self::query) for an already-embedded vector.
    pub fn query_vector<I: VectorIndex>(
        &self,
        corpus: &Corpus<I>,
        vector: &[f32],
        k: usize,
    ) -> PipelineResult<Vec<QueryHit>> {
        let metadata = corpus.metadata();
        if metadata.is_empty() {
            return Ok(Vec::new());
        }

        let rows = corpus
            .index()
            .search(vector, k)
            .map_err(StoreError::from)?;

        let hits: Vec<QueryHit> = rows
            .into_iter()
            .filter_map(|(row, distance)| match metadata.get(row) {
                Some(record) => Some(QueryHit {
                    record: record.clone(),
                    distance,
                }),
                None => {
                    tracing::warn!(
                        target: "query",
                        "dropping row {row}: no metadata record ({} records)",
                        metadata.len()
                    );
                    None
                }
            })
            .collect();

        tracing::debug!(target: "query", "{} hits for k={k}", hits.len());
        Ok(hits)
    }
}
