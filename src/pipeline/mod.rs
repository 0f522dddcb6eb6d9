//! Ingestion and query pipelines over a shared corpus.

pub mod ingest;
pub mod query;
pub mod session;

pub use ingest::{IngestProgress, IngestStats, IngestionPipeline, NoProgress, PreparedBatch};
pub use query::{QueryHit, QueryPipeline};
pub use session::{CorpusStats, RagSession};

use thiserror::Error;

use crate::config::ConfigError;
use crate::documents::{SourceError, TokenizerError};
use crate::semantic::EmbeddingError;
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
