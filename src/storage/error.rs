use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Vector dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corrupt vector index {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Unsupported vector index version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Corrupt metadata store {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Unsupported metadata schema version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors concerning the index and metadata store as a pair.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(
        "Vector index and metadata store are misaligned: {vectors} vectors, {records} records"
    )]
    Misaligned { vectors: usize, records: usize },

    #[error("Corpus manifest error: {0}")]
    Manifest(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
