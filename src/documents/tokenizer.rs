//! Tokenizer adapters used by the windowing chunker.
//!
//! The chunker only needs two deterministic operations: text to token ids and
//! token ids back to text. [`HfTokenizer`] wraps a HuggingFace `tokenizer.json`
//! (the same vocabulary the embedding model was trained with);
//! [`WhitespaceTokenizer`] is a model-free fallback where every
//! whitespace-separated word is one token.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::config::{TokenizerConfig, TokenizerKind};

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Failed to load tokenizer from {source_name}: {reason}")]
    LoadFailed { source_name: String, reason: String },

    #[error("Failed to encode text: {0}")]
    EncodeFailed(String),

    #[error("Failed to decode tokens: {0}")]
    DecodeFailed(String),
}

pub type TokenizerResult<T> = Result<T, TokenizerError>;

/// Deterministic encode/decode over a subword vocabulary.
pub trait TextTokenizer: Send + Sync {
    /// Encode text into token ids without special tokens.
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>>;

    /// Decode token ids back into text.
    ///
    /// The result is lossy with respect to the original whitespace.
    fn decode(&self, ids: &[u32]) -> TokenizerResult<String>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// HuggingFace tokenizer loaded from a local file or the hub.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    name: String,
}

impl std::fmt::Debug for HfTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTokenizer").field("name", &self.name).finish()
    }
}

impl HfTokenizer {
    /// Load a `tokenizer.json` from disk.
    pub fn from_file(path: impl AsRef<Path>) -> TokenizerResult<Self> {
        let path = path.as_ref();
        let inner =
            tokenizers::Tokenizer::from_file(path).map_err(|e| TokenizerError::LoadFailed {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::prepare(inner, path.display().to_string())
    }

    /// Fetch a tokenizer from the HuggingFace hub (cached after first download).
    pub fn from_pretrained(identifier: &str) -> TokenizerResult<Self> {
        let inner = tokenizers::Tokenizer::from_pretrained(identifier, None).map_err(|e| {
            TokenizerError::LoadFailed {
                source_name: identifier.to_string(),
                reason: e.to_string(),
            }
        })?;
        Self::prepare(inner, identifier.to_string())
    }

    /// Windows are cut by the chunker, so the model's own truncation and
    /// padding must not clip or pad the full-document encoding.
    fn prepare(mut inner: tokenizers::Tokenizer, name: String) -> TokenizerResult<Self> {
        inner
            .with_truncation(None)
            .map_err(|e| TokenizerError::LoadFailed {
                source_name: name.clone(),
                reason: e.to_string(),
            })?;
        inner.with_padding(None);

        tracing::debug!(target: "tokenizer", "loaded tokenizer {name}");
        Ok(Self { inner, name })
    }
}

impl TextTokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenizerError::EncodeFailed(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> TokenizerResult<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| TokenizerError::DecodeFailed(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default)]
struct Vocab {
    ids: HashMap<String, u32>,
    words: Vec<String>,
}

/// One token per whitespace-separated word; decoding joins words with a single space.
///
/// Ids are interned on first sight, so they are stable for the lifetime of the
/// instance but not across processes.
#[derive(Debug, Default)]
pub struct WhitespaceTokenizer {
    vocab: Mutex<Vocab>,
}

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextTokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        let mut vocab = self.vocab.lock();
        let mut ids = Vec::new();
        for word in text.split_whitespace() {
            let id = match vocab.ids.get(word).copied() {
                Some(id) => id,
                None => {
                    let id = u32::try_from(vocab.words.len()).map_err(|_| {
                        TokenizerError::EncodeFailed("vocabulary overflow".to_string())
                    })?;
                    vocab.ids.insert(word.to_string(), id);
                    vocab.words.push(word.to_string());
                    id
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[u32]) -> TokenizerResult<String> {
        let vocab = self.vocab.lock();
        let words = ids
            .iter()
            .map(|id| {
                vocab
                    .words
                    .get(*id as usize)
                    .map(String::as_str)
                    .ok_or_else(|| TokenizerError::DecodeFailed(format!("unknown token id {id}")))
            })
            .collect::<TokenizerResult<Vec<_>>>()?;
        Ok(words.join(" "))
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Build the tokenizer described by settings.
pub fn from_settings(config: &TokenizerConfig) -> TokenizerResult<Box<dyn TextTokenizer>> {
    match config.kind {
        TokenizerKind::Whitespace => Ok(Box::new(WhitespaceTokenizer::new())),
        TokenizerKind::Huggingface => match &config.path {
            Some(path) => Ok(Box::new(HfTokenizer::from_file(path)?)),
            None => Ok(Box::new(HfTokenizer::from_pretrained(&config.identifier)?)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_encode_decode() {
        let tokenizer = WhitespaceTokenizer::new();
        let ids = tokenizer.encode("A B  C\nA").unwrap();
        assert_eq!(ids, vec![0, 1, 2, 0]);
        assert_eq!(tokenizer.decode(&ids[1..3]).unwrap(), "B C");
    }

    #[test]
    fn test_whitespace_empty_text() {
        let tokenizer = WhitespaceTokenizer::new();
        assert!(tokenizer.encode("   \n\t").unwrap().is_empty());
        assert_eq!(tokenizer.decode(&[]).unwrap(), "");
    }

    #[test]
    fn test_whitespace_unknown_id_fails() {
        let tokenizer = WhitespaceTokenizer::new();
        assert!(matches!(
            tokenizer.decode(&[42]),
            Err(TokenizerError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_from_settings_whitespace() {
        let config = TokenizerConfig {
            kind: TokenizerKind::Whitespace,
            ..TokenizerConfig::default()
        };
        let tokenizer = from_settings(&config).unwrap();
        assert_eq!(tokenizer.name(), "whitespace");
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let err = HfTokenizer::from_file("/nonexistent/tokenizer.json").unwrap_err();
        assert!(matches!(err, TokenizerError::LoadFailed { .. }));
    }

    #[test]
    #[ignore = "Downloads tokenizer.json from the HuggingFace hub - run with --ignored"]
    fn test_hf_tokenizer_roundtrip() {
        let tokenizer = HfTokenizer::from_pretrained("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        let text = "Retrieval augmented generation grounds answers in documents. ".repeat(40);
        let ids = tokenizer.encode(&text).unwrap();
        // No truncation to the model's 128/256 token limit
        assert!(ids.len() > 256);
        let decoded = tokenizer.decode(&ids[..5]).unwrap();
        assert!(decoded.starts_with("retrieval"));
    }
}
