//! Token-window chunking, exact vector search and row-aligned chunk metadata
//! for retrieval-augmented generation.

pub mod cli;
pub mod config;
pub mod documents;
pub mod logging;
pub mod pipeline;
pub mod semantic;
pub mod storage;
pub mod utils;

pub use config::{ConfigError, Settings};
pub use documents::{Chunk, ChunkId, Document, DocumentSource, TextTokenizer, WindowChunker};
pub use pipeline::{
    IngestProgress, IngestStats, IngestionPipeline, PipelineError, PipelineResult, QueryHit,
    QueryPipeline, RagSession,
};
pub use semantic::{EmbeddingBatcher, EmbeddingError, EmbeddingGenerator};
pub use storage::{
    Corpus, CorpusPersistence, FlatL2Index, MetadataRecord, MetadataStore, StoreError,
    VectorIndex,
};
