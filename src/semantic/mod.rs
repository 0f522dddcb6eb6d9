//! Embedding generation for chunk and query text.
//!
//! This module provides:
//! - The `EmbeddingGenerator` seam and a fastembed-backed implementation
//! - A pool of model instances for parallel batches
//! - An optional content-hash cache
//! - The order-preserving `EmbeddingBatcher`

pub mod batcher;
pub mod cache;
pub mod generator;
pub mod pool;

pub use batcher::EmbeddingBatcher;
pub use cache::CachingGenerator;
pub use generator::{
    EmbeddingError, EmbeddingGenerator, EmbeddingResult, FastEmbedGenerator, ModelOptions,
    parse_model,
};
pub use pool::EmbeddingPool;

// Re-export key types
pub use fastembed::{EmbeddingModel, TextEmbedding};

use std::sync::Arc;

use crate::config::EmbeddingConfig;

/// Build the generator described by the embedding settings.
///
/// A pool is used when more than one instance is requested; the cache wraps
/// whichever generator was built.
pub fn from_settings(config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingGenerator>> {
    let mut options = ModelOptions::new(config.model.clone());
    options.show_download_progress = config.show_download_progress;
    if let Some(dir) = &config.cache_dir {
        options.cache_dir = dir.clone();
    }

    let generator: Arc<dyn EmbeddingGenerator> = if config.pool_size > 1 {
        Arc::new(EmbeddingPool::new(config.pool_size, &options)?)
    } else {
        Arc::new(FastEmbedGenerator::new(&options)?)
    };

    if config.cache {
        Ok(Arc::new(CachingGenerator::new(generator)))
    } else {
        Ok(generator)
    }
}
