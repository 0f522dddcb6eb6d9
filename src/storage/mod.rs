//! Vector index, metadata store and their persistence.

pub mod corpus;
pub mod error;
pub mod metadata;
pub mod metadata_store;
pub mod persistence;
pub mod vector_index;

pub use corpus::Corpus;
pub use error::{
    IndexError, IndexResult, MetadataError, MetadataResult, StoreError, StoreResult,
};
pub use metadata::CorpusManifest;
pub use metadata_store::{MetadataRecord, MetadataStore};
pub use persistence::CorpusPersistence;
pub use vector_index::{FlatL2Index, VectorIndex, squared_l2};
