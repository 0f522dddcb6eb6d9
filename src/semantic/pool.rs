//! Embedding model pool for parallel embedding generation
//!
//! Provides multiple TextEmbedding instances that can be used concurrently
//! by different threads, so batches can be embedded in parallel.

use crossbeam_channel::{Receiver, Sender, bounded};
use fastembed::TextEmbedding;

use super::generator::{EmbeddingError, EmbeddingGenerator, EmbeddingResult, ModelOptions};

/// Pool of TextEmbedding models.
///
/// Each model instance is expensive (~86MB for AllMiniLML6V2), but having
/// several allows true parallel batches with rayon.
pub struct EmbeddingPool {
    /// Channel to acquire models from the pool
    model_sender: Sender<TextEmbedding>,
    model_receiver: Receiver<TextEmbedding>,
    /// Number of models in the pool
    pool_size: usize,
    /// Model dimensions (all models have same dimensions)
    dimensions: usize,
    model_name: String,
}

impl std::fmt::Debug for EmbeddingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingPool")
            .field("pool_size", &self.pool_size)
            .field("dimensions", &self.dimensions)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl EmbeddingPool {
    /// Create a new embedding pool with the specified number of model instances.
    pub fn new(pool_size: usize, options: &ModelOptions) -> EmbeddingResult<Self> {
        let pool_size = pool_size.max(1);
        let (sender, receiver) = bounded(pool_size);

        tracing::info!(
            target: "embedding",
            "Initializing embedding pool: {pool_size} instances ({})",
            options.model_name
        );

        let mut dimensions = 0;

        for i in 0..pool_size {
            // Only show progress for first model
            let (model, dim) = options
                .load_instance(options.show_download_progress && i == 0)
                .map_err(|e| {
                    EmbeddingError::ModelInit(format!(
                        "Failed to initialize model instance {}: {e}",
                        i + 1
                    ))
                })?;
            if i == 0 {
                dimensions = dim;
            } else if dim != dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimensions,
                    actual: dim,
                });
            }

            sender
                .send(model)
                .map_err(|_| EmbeddingError::PoolClosed)?;
        }

        tracing::info!(
            target: "embedding",
            "Embedding pool ready: {pool_size} instances, {dimensions} dimensions"
        );

        Ok(Self {
            model_sender: sender,
            model_receiver: receiver,
            pool_size,
            dimensions,
            model_name: options.model_name.clone(),
        })
    }

    /// Acquire a model from the pool (blocks if none available)
    fn acquire(&self) -> EmbeddingResult<TextEmbedding> {
        self.model_receiver
            .recv()
            .map_err(|_| EmbeddingError::PoolClosed)
    }

    /// Return a model to the pool
    fn release(&self, model: TextEmbedding) {
        let _ = self.model_sender.send(model);
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl EmbeddingGenerator for EmbeddingPool {
    /// Thread-safe: acquires a model, embeds the whole slice, returns the model.
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self.acquire()?;
        let result = model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()));
        self.release(model);
        result
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
