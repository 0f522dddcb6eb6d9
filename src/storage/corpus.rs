//! The vector index and metadata store as one aligned unit.

use super::error::{StoreError, StoreResult};
use super::metadata_store::{MetadataRecord, MetadataStore};
use super::vector_index::{FlatL2Index, VectorIndex};

/// Vector index plus metadata store, kept row-aligned.
///
/// Row `i` of the index and record `i` of the store always describe the
/// same chunk. The only mutation is [`append_aligned`](Self::append_aligned),
/// which grows both sides by the same amount or neither.
#[derive(Debug, Clone)]
pub struct Corpus<I = FlatL2Index> {
    index: I,
    metadata: MetadataStore,
}

impl Corpus<FlatL2Index> {
    /// Empty corpus over an exact index of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            index: FlatL2Index::new(dimension),
            metadata: MetadataStore::new(),
        }
    }
}

impl<I: VectorIndex> Corpus<I> {
    /// Pair an existing index with its metadata, refusing a misaligned pair.
    pub fn from_parts(index: I, metadata: MetadataStore) -> StoreResult<Self> {
        if index.len() != metadata.len() {
            return Err(StoreError::Misaligned {
                vectors: index.len(),
                records: metadata.len(),
            });
        }
        Ok(Self { index, metadata })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Number of rows (equal on both sides).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append one vector and one record per chunk.
    ///
    /// Lengths and dimensions are validated before either side is touched,
    /// so a failed append leaves the corpus exactly as it was.
    pub fn append_aligned(
        &mut self,
        vectors: &[Vec<f32>],
        records: Vec<MetadataRecord>,
    ) -> StoreResult<()> {
        if vectors.len() != records.len() {
            return Err(StoreError::Misaligned {
                vectors: vectors.len(),
                records: records.len(),
            });
        }
        if vectors.is_empty() {
            return Ok(());
        }

        self.index.add(vectors)?;
        self.metadata.append(records);

        debug_assert_eq!(self.index.len(), self.metadata.len());
        tracing::debug!(
            target: "index",
            "appended {} rows, corpus now {}",
            vectors.len(),
            self.len()
        );
        Ok(())
    }
}
