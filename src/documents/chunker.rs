//! Sliding-window chunking over token sequences.
//!
//! Provides the `Chunker` trait and the token-window implementation that
//! splits a document into overlapping windows suitable for embedding.

use std::sync::Arc;

use super::config::ChunkingConfig;
use super::tokenizer::{TextTokenizer, TokenizerError};
use super::types::TextWindow;
use crate::config::ConfigResult;

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document text into windows.
    fn chunk(&self, text: &str) -> Result<Vec<TextWindow>, TokenizerError>;
}

/// Half-open token ranges covering `[0, total_tokens)`.
///
/// Windows start at `0, step, 2*step, ...` and hold up to `chunk_size` tokens,
/// clipped at the end. Iteration stops after the window that reaches
/// `total_tokens`, so there is never a zero-length trailing window.
/// Yields nothing when `total_tokens == 0`.
#[derive(Debug, Clone)]
pub struct WindowRanges {
    next_start: Option<usize>,
    total: usize,
    chunk_size: usize,
    step: usize,
}

impl WindowRanges {
    /// `config` must be validated.
    pub fn new(total_tokens: usize, config: &ChunkingConfig) -> Self {
        Self {
            next_start: (total_tokens > 0).then_some(0),
            total: total_tokens,
            chunk_size: config.chunk_size,
            step: config.step(),
        }
    }
}

impl Iterator for WindowRanges {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        let end = start.saturating_add(self.chunk_size).min(self.total);
        self.next_start = (end < self.total).then_some(start + self.step);
        Some((start, end))
    }
}

/// Token-window chunker.
///
/// Windows are decoded back to text with the tokenizer; that text is the
/// canonical chunk text and may differ from the source substring.
pub struct WindowChunker {
    tokenizer: Arc<dyn TextTokenizer>,
    config: ChunkingConfig,
}

impl std::fmt::Debug for WindowChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowChunker")
            .field("tokenizer", &self.tokenizer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl WindowChunker {
    /// Create a chunker, rejecting invalid window parameters up front.
    pub fn new(tokenizer: Arc<dyn TextTokenizer>, config: ChunkingConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { tokenizer, config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }
}

impl Chunker for WindowChunker {
    fn chunk(&self, text: &str) -> Result<Vec<TextWindow>, TokenizerError> {
        let token_ids = self.tokenizer.encode(text)?;
        if token_ids.is_empty() {
            return Ok(Vec::new());
        }

        let windows = WindowRanges::new(token_ids.len(), &self.config)
            .map(|(start, end)| {
                Ok(TextWindow {
                    text: self.tokenizer.decode(&token_ids[start..end])?,
                    start_token: start,
                    end_token: end,
                })
            })
            .collect::<Result<Vec<_>, TokenizerError>>()?;

        tracing::trace!(
            target: "chunker",
            "{} tokens -> {} windows",
            token_ids.len(),
            windows.len()
        );
        Ok(windows)
    }
}
