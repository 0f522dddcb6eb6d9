//! Embedding generators: the seam between the pipeline and an embedding model.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for embedding operations
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    ModelInit(String),

    #[error("Failed to generate embedding: {0}")]
    Generation(String),

    #[error("Unknown embedding model '{0}'")]
    UnknownModel(String),

    #[error("Embedding provider returned {actual} vectors for {expected} texts")]
    UnexpectedCount { expected: usize, actual: usize },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding pool closed")]
    PoolClosed,
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Anything that turns texts into fixed-dimension vectors.
///
/// Implementations must be deterministic for a fixed model and input and
/// return exactly one vector per input text, in input order.
pub trait EmbeddingGenerator: Send + Sync {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Dimension of every vector this generator produces.
    fn dimension(&self) -> usize;

    /// Model identifier, recorded in the corpus manifest.
    fn model_name(&self) -> &str;
}

/// Map a configured model name onto a fastembed model.
pub fn parse_model(name: &str) -> EmbeddingResult<EmbeddingModel> {
    let model = match name {
        "AllMiniLML6V2" => EmbeddingModel::AllMiniLML6V2,
        "AllMiniLML12V2" => EmbeddingModel::AllMiniLML12V2,
        "BGESmallENV15" => EmbeddingModel::BGESmallENV15,
        "BGEBaseENV15" => EmbeddingModel::BGEBaseENV15,
        "BGELargeENV15" => EmbeddingModel::BGELargeENV15,
        "ParaphraseMLMiniLML12V2" => EmbeddingModel::ParaphraseMLMiniLML12V2,
        "MultilingualE5Small" => EmbeddingModel::MultilingualE5Small,
        "NomicEmbedTextV15" => EmbeddingModel::NomicEmbedTextV15,
        other => return Err(EmbeddingError::UnknownModel(other.to_string())),
    };
    Ok(model)
}

/// Options shared by every fastembed-backed generator.
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub model_name: String,
    pub cache_dir: PathBuf,
    pub show_download_progress: bool,
}

impl ModelOptions {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            cache_dir: crate::utils::models_dir(),
            show_download_progress: true,
        }
    }

    /// Load one model instance and probe its output dimension.
    pub(crate) fn load_instance(
        &self,
        show_progress: bool,
    ) -> EmbeddingResult<(TextEmbedding, usize)> {
        let model = parse_model(&self.model_name)?;
        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(self.cache_dir.clone())
                .with_show_download_progress(show_progress),
        )
        .map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;

        // Get dimensions by generating a test embedding
        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;
        let dimension = probe
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or(EmbeddingError::UnexpectedCount {
                expected: 1,
                actual: 0,
            })?;

        Ok((text_model, dimension))
    }
}

/// Single fastembed model instance behind a mutex.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedGenerator {
    pub fn new(options: &ModelOptions) -> EmbeddingResult<Self> {
        let (model, dimension) = options.load_instance(options.show_download_progress)?;
        tracing::info!(
            target: "embedding",
            "loaded {} ({dimension} dimensions)",
            options.model_name
        );
        Ok(Self {
            model: Mutex::new(model),
            dimension,
            model_name: options.model_name.clone(),
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
