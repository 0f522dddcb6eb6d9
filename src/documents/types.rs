//! Core types for documents and their token windows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the document id and the chunk ordinal in a chunk id.
pub const CHUNK_ID_SEPARATOR: &str = "__";

/// A unit of source content handed to ingestion by a [`DocumentSource`].
///
/// [`DocumentSource`]: super::source::DocumentSource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable, source-assigned identifier.
    pub id: String,

    /// Human readable name (file name, page title).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Mime type or source-specific type tag.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "mimeType")]
    pub mime_type: Option<String>,

    /// Extracted plain text. Empty when extraction failed.
    #[serde(default)]
    pub text: String,
}

impl Document {
    /// Create a document with a name and mime type.
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        mime_type: Option<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name,
            mime_type,
            text: text.into(),
        }
    }

    /// Create a document that carries only an id and text.
    pub fn from_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, None, None, text)
    }

    /// Whether the document has nothing to chunk.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Identifier of a chunk: `doc_id` + `"__"` + ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    /// Build the id for the `ordinal`-th window of `doc_id`.
    pub fn new(doc_id: &str, ordinal: usize) -> Self {
        Self(format!("{doc_id}{CHUNK_ID_SEPARATOR}{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into document id and ordinal.
    ///
    /// Uses the last separator, so document ids may themselves contain `"__"`.
    pub fn parts(&self) -> Option<(&str, usize)> {
        let (doc_id, ordinal) = self.0.rsplit_once(CHUNK_ID_SEPARATOR)?;
        Some((doc_id, ordinal.parse().ok()?))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One token window produced by the chunker, before it is tied to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    /// Decoded text of the window's tokens.
    pub text: String,
    /// First token of the window (inclusive).
    pub start_token: usize,
    /// End of the window (exclusive).
    pub end_token: usize,
}

impl TextWindow {
    pub fn token_len(&self) -> usize {
        self.end_token - self.start_token
    }
}

/// A token-bounded slice of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub doc_id: String,
    /// 0-based position within the document.
    pub ordinal: usize,
    pub start_token: usize,
    pub end_token: usize,
    /// Decoded window text. Not guaranteed byte-identical to the source substring.
    pub text: String,
}

impl Chunk {
    pub fn from_window(doc_id: &str, ordinal: usize, window: TextWindow) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            ordinal,
            start_token: window.start_token,
            end_token: window.end_token,
            text: window.text,
        }
    }

    pub fn chunk_id(&self) -> ChunkId {
        ChunkId::new(&self.doc_id, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_format() {
        let id = ChunkId::new("d1", 2);
        assert_eq!(id.as_str(), "d1__2");
        assert_eq!(id.to_string(), "d1__2");
    }

    #[test]
    fn test_chunk_id_parts_with_separator_in_doc_id() {
        let id = ChunkId::new("folder__file", 11);
        assert_eq!(id.parts(), Some(("folder__file", 11)));
    }

    #[test]
    fn test_document_blank_detection() {
        assert!(Document::from_text("a", "").is_blank());
        assert!(Document::from_text("a", " \n\t ").is_blank());
        assert!(!Document::from_text("a", " x ").is_blank());
    }

    #[test]
    fn test_document_accepts_connector_field_names() {
        let doc: Document =
            serde_json::from_str(r#"{"id":"p1","name":"Page","mimeType":"notion-page","text":"hi"}"#)
                .unwrap();
        assert_eq!(doc.mime_type.as_deref(), Some("notion-page"));
        assert_eq!(doc.name.as_deref(), Some("Page"));
    }

    #[test]
    fn test_chunk_from_window() {
        let window = TextWindow {
            text: "d e f g".to_string(),
            start_token: 3,
            end_token: 7,
        };
        assert_eq!(window.token_len(), 4);
        let chunk = Chunk::from_window("d1", 1, window);
        assert_eq!(chunk.chunk_id().as_str(), "d1__1");
        assert_eq!((chunk.start_token, chunk.end_token), (3, 7));
    }
}
