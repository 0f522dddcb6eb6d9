//! Documents, tokenization and token-window chunking.
//!
//! This module provides:
//! - The `Document` and `Chunk` data model
//! - Tokenizer adapters (HuggingFace and whitespace)
//! - Deterministic sliding-window chunking over token sequences
//! - `DocumentSource` implementations feeding ingestion

pub mod chunker;
pub mod config;
pub mod source;
pub mod tokenizer;
pub mod types;

pub use chunker::{Chunker, WindowChunker, WindowRanges};
pub use config::ChunkingConfig;
pub use source::{DirectorySource, DocumentSource, JsonlSource, SourceError, StaticSource};
pub use tokenizer::{HfTokenizer, TextTokenizer, TokenizerError, WhitespaceTokenizer};
pub use types::{Chunk, ChunkId, Document, TextWindow};
