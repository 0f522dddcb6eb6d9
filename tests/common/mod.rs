//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ragcore::config::TokenizerKind;
use ragcore::documents::{ChunkingConfig, TextTokenizer, WhitespaceTokenizer};
use ragcore::semantic::{EmbeddingGenerator, EmbeddingResult};
use ragcore::{RagSession, Settings};

pub const DIM: usize = 16;

/// Bag-of-words embedding: each word adds 1.0 to an FNV-1a hashed bucket.
///
/// Single ASCII letters land in distinct buckets, which keeps the
/// letter-sequence fixtures unambiguous.
pub struct HashingStub {
    dimension: usize,
    pub calls: AtomicUsize,
}

impl HashingStub {
    pub fn new(dimension: usize) -> Arc<Self> {
        Arc::new(Self {
            dimension,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dimension];
        for word in text.split_whitespace() {
            let mut hash: u64 = 0xcbf29ce484222325;
            for b in word.bytes() {
                hash ^= b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % self.dimension as u64) as usize] += 1.0;
        }
        v
    }
}

impl EmbeddingGenerator for HashingStub {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing-stub"
    }
}

/// Settings with whitespace tokens, 4/1 windows and a 16-dim corpus under `root`.
pub fn settings(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.data_dir = root.join("data");
    settings.chunking = ChunkingConfig::new(4, 1);
    settings.embedding.dimension = DIM;
    settings.embedding.batch_size = 2;
    settings.tokenizer.kind = TokenizerKind::Whitespace;
    settings
}

pub fn tokenizer() -> Arc<dyn TextTokenizer> {
    Arc::new(WhitespaceTokenizer::new())
}

pub fn open(settings: &Settings) -> RagSession {
    RagSession::open(
        settings,
        HashingStub::new(settings.embedding.dimension),
        tokenizer(),
    )
    .expect("session should open")
}
