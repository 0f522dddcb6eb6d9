//! Configuration module for the retrieval core.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! The command line only chooses which TOML file is read (`--config`).
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `RAGCORE_` and use double underscores
//! to separate nested levels:
//! - `RAGCORE_CHUNKING__CHUNK_SIZE=256` sets `chunking.chunk_size`
//! - `RAGCORE_EMBEDDING__BATCH_SIZE=16` sets `embedding.batch_size`
//! - `RAGCORE_QUERY__DEFAULT_K=5` sets `query.default_k`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use crate::documents::config::ChunkingConfig;

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".ragcore";

/// Fatal configuration problems, surfaced at construction time rather than per call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid chunking parameters (chunk_size={chunk_size}, overlap={overlap}): {reason}")]
    InvalidChunking {
        chunk_size: usize,
        overlap: usize,
        reason: String,
    },

    #[error("Dimension mismatch for {context}: configured {expected}, found {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the persisted vector index, metadata and manifest
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Token windowing parameters
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Tokenizer settings
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Query defaults
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// fastembed model name (e.g. "AllMiniLML6V2")
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Dimension every stored vector must have
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Number of texts per embedding call. Bounds peak memory, never changes results.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of model instances kept for concurrent batches
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Run batches in parallel across the pool
    #[serde(default)]
    pub parallel: bool,

    /// Cache embeddings by content hash for the lifetime of the process
    #[serde(default)]
    pub cache: bool,

    /// Show the model download progress bar
    #[serde(default = "default_true")]
    pub show_download_progress: bool,

    /// Override for the model cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// Which tokenizer backs the windowing chunker.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// HuggingFace `tokenizer.json` (local path or hub identifier)
    #[default]
    Huggingface,
    /// One token per whitespace-separated word
    Whitespace,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub kind: TokenizerKind,

    /// Hub identifier used when no local path is configured
    #[serde(default = "default_tokenizer_identifier")]
    pub identifier: String,

    /// Local `tokenizer.json`, takes precedence over `identifier`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    /// Number of chunks returned when the caller does not specify k
    #[serde(default = "default_k")]
    pub default_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all targets
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `ingest = "info"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("data")
}
fn default_true() -> bool {
    true
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_dimension() -> usize {
    384
}
fn default_batch_size() -> usize {
    64
}
fn default_pool_size() -> usize {
    1
}
fn default_tokenizer_identifier() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}
fn default_k() -> usize {
    2
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            tokenizer: TokenizerConfig::default(),
            query: QueryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            pool_size: default_pool_size(),
            parallel: false,
            cache: false,
            show_download_progress: true,
            cache_dir: None,
        }
    }
}

impl EmbeddingConfig {
    /// Validate values that would otherwise fail deep inside a pipeline call.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.dimension == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "embedding.dimension".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "embedding.batch_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: TokenizerKind::default(),
            identifier: default_tokenizer_identifier(),
            path: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels,
            // single underscore stays inside field names
            .merge(Env::prefixed("RAGCORE_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for the .ragcore directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Path of the persisted vector index blob
    pub fn index_file(&self) -> PathBuf {
        self.data_dir.join(crate::storage::persistence::INDEX_FILE)
    }

    /// Path of the persisted metadata records
    pub fn metadata_file(&self) -> PathBuf {
        self.data_dir.join(crate::storage::persistence::METADATA_FILE)
    }

    /// Validate every section that has construction-time invariants
    pub fn validate(&self) -> ConfigResult<()> {
        self.chunking.validate()?;
        self.embedding.validate()?;
        if self.query.default_k == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "query.default_k".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file
    pub fn init_config_file(
        path: Option<&Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
