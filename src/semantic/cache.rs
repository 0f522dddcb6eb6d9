//! Content-hash embedding cache.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::generator::{EmbeddingError, EmbeddingGenerator, EmbeddingResult};
use crate::utils::content_hash;

/// Wraps a generator and remembers vectors by the SHA-256 of their text.
///
/// Only texts missing from the cache are forwarded, in their original
/// relative order, so the inner generator sees a single call per request.
pub struct CachingGenerator {
    inner: Arc<dyn EmbeddingGenerator>,
    cache: DashMap<String, Vec<f32>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl CachingGenerator {
    pub fn new(inner: Arc<dyn EmbeddingGenerator>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl EmbeddingGenerator for CachingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| content_hash(t)).collect();
        let mut slots: Vec<Option<Vec<f32>>> = keys
            .iter()
            .map(|k| self.cache.get(k).map(|v| v.value().clone()))
            .collect();

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| slots[i].is_none()).collect();
        self.hits
            .fetch_add(texts.len() - missing.len(), Ordering::Relaxed);
        self.misses.fetch_add(missing.len(), Ordering::Relaxed);

        if !missing.is_empty() {
            let pending: Vec<&str> = missing.iter().map(|&i| texts[i]).collect();
            let fresh = self.inner.generate_embeddings(&pending)?;
            if fresh.len() != pending.len() {
                return Err(EmbeddingError::UnexpectedCount {
                    expected: pending.len(),
                    actual: fresh.len(),
                });
            }
            for (i, vector) in missing.into_iter().zip(fresh) {
                self.cache.insert(keys[i].clone(), vector.clone());
                slots[i] = Some(vector);
            }
        }

        tracing::trace!(target: "embedding", "cache size {}", self.cache.len());
        Ok(slots.into_iter().flatten().collect())
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
