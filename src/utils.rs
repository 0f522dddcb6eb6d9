//! Common utilities shared across modules.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Get current UTC timestamp in seconds since UNIX_EPOCH.
///
/// Uses chrono for accurate cross-platform timestamp.
pub fn get_utc_timestamp() -> u64 {
    Utc::now().timestamp() as u64
}

/// Hex-encoded SHA-256 of a text, used as a content-addressed cache key.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")
}

/// Default location for downloaded embedding models.
///
/// Shared across projects so that each workspace does not re-download the
/// same ONNX weights.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ragcore")
        .join("models")
}

/// Write `bytes` to `path` through a temp file in the same directory.
///
/// Readers never observe a half-written file: the temp file is synced and
/// then renamed over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    persist_staged(stage_file(path, bytes)?, path)
}

/// Write and sync `bytes` to a temp file next to `path` without replacing it.
///
/// Dropping the returned file discards it, leaving `path` untouched.
pub fn stage_file(path: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Rename a file from [`stage_file`] over `path`.
pub fn persist_staged(tmp: NamedTempFile, path: &Path) -> std::io::Result<()> {
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
