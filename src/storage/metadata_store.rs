//! Row-ordered chunk metadata, aligned position-for-position with the vector index.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{MetadataError, MetadataResult};
use crate::documents::{Chunk, ChunkId, Document};

/// Schema version written alongside the records.
pub const SCHEMA_VERSION: u32 = 1;

/// Persisted sibling of a chunk: everything needed to show it without the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub doc_id: String,
    pub chunk_id: ChunkId,
    pub ordinal: usize,
    pub source_name: Option<String>,
    pub mime_type: Option<String>,
    pub start_token: usize,
    pub end_token: usize,
    pub text: String,
}

impl MetadataRecord {
    /// Build the record for a chunk of `document`.
    pub fn from_chunk(chunk: Chunk, document: &Document) -> Self {
        Self {
            chunk_id: chunk.chunk_id(),
            doc_id: chunk.doc_id,
            ordinal: chunk.ordinal,
            source_name: document.name.clone(),
            mime_type: document.mime_type.clone(),
            start_token: chunk.start_token,
            end_token: chunk.end_token,
            text: chunk.text,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    schema_version: u32,
    records: &'a [MetadataRecord],
}

#[derive(Deserialize)]
struct Envelope {
    records: Vec<MetadataRecord>,
}

#[derive(Deserialize)]
struct VersionProbe {
    schema_version: u32,
}

/// Append-only sequence of [`MetadataRecord`]s. Row `i` describes vector `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    records: Vec<MetadataRecord>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&MetadataRecord> {
        self.records.get(row)
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn append(&mut self, records: Vec<MetadataRecord>) {
        self.records.extend(records);
    }

    /// Number of distinct documents with at least one record.
    pub fn document_count(&self) -> usize {
        let mut ids: Vec<&str> = self.records.iter().map(|r| r.doc_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Load persisted records, or start empty if the file does not exist.
    pub fn load(path: &Path) -> MetadataResult<Self> {
        if !path.exists() {
            tracing::info!(
                target: "metadata",
                "no metadata at {}, starting empty",
                path.display()
            );
            return Ok(Self::new());
        }

        let bytes = std::fs::read(path).map_err(|source| MetadataError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let corrupt = |e: serde_json::Error| MetadataError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let probe: VersionProbe = serde_json::from_slice(&bytes).map_err(corrupt)?;
        if probe.schema_version != SCHEMA_VERSION {
            return Err(MetadataError::UnsupportedVersion {
                found: probe.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        let envelope: Envelope = serde_json::from_slice(&bytes).map_err(corrupt)?;

        tracing::debug!(
            target: "metadata",
            "loaded {} records from {}",
            envelope.records.len(),
            path.display()
        );
        Ok(Self {
            records: envelope.records,
        })
    }

    /// The persisted form: records wrapped with the schema version.
    pub fn to_json(&self) -> MetadataResult<Vec<u8>> {
        serde_json::to_vec(&EnvelopeRef {
            schema_version: SCHEMA_VERSION,
            records: &self.records,
        })
        .map_err(|e| MetadataError::Serialization(e.to_string()))
    }

    /// Persist atomically, preserving row order.
    pub fn save(&self, path: &Path) -> MetadataResult<()> {
        let json = self.to_json()?;
        crate::utils::write_atomic(path, &json).map_err(|source| MetadataError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            target: "metadata",
            "saved {} records to {}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::TextWindow;
    use tempfile::TempDir;

    fn record(doc_id: &str, ordinal: usize, text: &str) -> MetadataRecord {
        let doc = Document::new(doc_id, Some(format!("{doc_id}.txt")), None, "");
        let chunk = Chunk::from_window(
            doc_id,
            ordinal,
            TextWindow {
                text: text.to_string(),
                start_token: ordinal * 3,
                end_token: ordinal * 3 + 4,
            },
        );
        MetadataRecord::from_chunk(chunk, &doc)
    }

    #[test]
    fn test_from_chunk_carries_document_fields() {
        let rec = record("d1", 2, "G H");
        assert_eq!(rec.chunk_id.as_str(), "d1__2");
        assert_eq!(rec.source_name.as_deref(), Some("d1.txt"));
        assert!(rec.mime_type.is_none());
        assert_eq!((rec.start_token, rec.end_token), (6, 10));
    }

    #[test]
    fn test_save_load_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metadata.json");

        let mut store = MetadataStore::new();
        store.append(vec![record("b", 0, "x"), record("a", 0, "y"), record("b", 1, "z")]);
        store.save(&path).unwrap();

        let loaded = MetadataStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.get(1).unwrap().doc_id, "a");
        assert_eq!(loaded.document_count(), 2);
    }

    #[test]
    fn test_persisted_form_is_versioned() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metadata.json");
        MetadataStore::new().save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert!(value["records"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::load(&temp_dir.path().join("nope.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metadata.json");
        std::fs::write(&path, "{\"schema_version\":1,\"records\":[{\"doc_id\":").unwrap();
        assert!(matches!(
            MetadataStore::load(&path),
            Err(MetadataError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_future_schema_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metadata.json");
        std::fs::write(&path, "{\"schema_version\":7,\"records\":[]}").unwrap();
        assert!(matches!(
            MetadataStore::load(&path),
            Err(MetadataError::UnsupportedVersion { found: 7, .. })
        ));
    }
}
