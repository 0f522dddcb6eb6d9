//! Configuration types for token-window chunking.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};

/// Configuration for sliding-window chunking over token sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum number of tokens per window.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens shared between consecutive windows.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    400
}

fn default_overlap() -> usize {
    64
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkingConfig {
    /// Create a config without validating it.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 {
            return Err(self.invalid("chunk_size must be greater than zero"));
        }

        if self.overlap >= self.chunk_size {
            return Err(self.invalid("overlap must be less than chunk_size"));
        }

        Ok(())
    }

    /// Distance between consecutive window starts.
    ///
    /// Only meaningful for a validated config.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidChunking {
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            reason: reason.to_string(),
        }
    }
}
