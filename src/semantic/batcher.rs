//! Order-preserving batched embedding.

use rayon::prelude::*;
use std::sync::Arc;

use super::generator::{EmbeddingError, EmbeddingGenerator, EmbeddingResult};
use crate::config::{ConfigError, ConfigResult};

/// Splits texts into fixed-size batches and embeds them.
///
/// Output position `i` always corresponds to input position `i`. Batch size
/// only bounds the size of each provider call; it never changes the result.
/// In parallel mode batches run on the rayon pool and are reassembled in
/// input order.
pub struct EmbeddingBatcher {
    generator: Arc<dyn EmbeddingGenerator>,
    batch_size: usize,
    parallel: bool,
}

impl std::fmt::Debug for EmbeddingBatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingBatcher")
            .field("model", &self.generator.model_name())
            .field("batch_size", &self.batch_size)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl EmbeddingBatcher {
    pub fn new(generator: Arc<dyn EmbeddingGenerator>, batch_size: usize) -> ConfigResult<Self> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "embedding.batch_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            generator,
            batch_size,
            parallel: false,
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn dimension(&self) -> usize {
        self.generator.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed every text, one vector per text, in input order.
    pub fn embed<S>(&self, texts: &[S]) -> EmbeddingResult<Vec<Vec<f32>>>
    where
        S: AsRef<str> + Sync,
    {
        self.embed_with_progress(texts, |_, _| {})
    }

    /// Like [`embed`](Self::embed), reporting `(embedded, total)` as batches finish.
    ///
    /// In parallel mode progress is reported once, after all batches complete.
    pub fn embed_with_progress<S, F>(
        &self,
        texts: &[S],
        mut on_progress: F,
    ) -> EmbeddingResult<Vec<Vec<f32>>>
    where
        S: AsRef<str> + Sync,
        F: FnMut(usize, usize),
    {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let total = texts.len();

        let vectors = if self.parallel {
            let batches = texts
                .par_chunks(self.batch_size)
                .map(|batch| self.embed_batch(batch))
                .collect::<EmbeddingResult<Vec<_>>>()?;
            on_progress(total, total);
            batches.into_iter().flatten().collect()
        } else {
            let mut vectors = Vec::with_capacity(total);
            for batch in texts.chunks(self.batch_size) {
                vectors.extend(self.embed_batch(batch)?);
                on_progress(vectors.len(), total);
            }
            vectors
        };

        tracing::debug!(
            target: "embedding",
            "embedded {total} texts in batches of {}",
            self.batch_size
        );
        Ok(vectors)
    }

    /// Embed a single text, e.g. a query.
    pub fn embed_one(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or(EmbeddingError::UnexpectedCount {
                expected: 1,
                actual: 0,
            })
    }

    fn embed_batch<S: AsRef<str>>(&self, batch: &[S]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let refs: Vec<&str> = batch.iter().map(|s| s.as_ref()).collect();
        let vectors = self.generator.generate_embeddings(&refs)?;

        if vectors.len() != refs.len() {
            return Err(EmbeddingError::UnexpectedCount {
                expected: refs.len(),
                actual: vectors.len(),
            });
        }
        let expected = self.generator.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }
        Ok(vectors)
    }
}
