//! Append-only exact nearest-neighbor index.
//!
//! Rows are addressed by insertion position. The persisted form is a single
//! little-endian blob:
//!
//! ```text
//! magic "RGVI" | version u32 | dimension u32 | count u64 | count * dimension f32
//! ```

use rayon::prelude::*;
use std::cmp::Ordering;
use std::path::Path;

use super::error::{IndexError, IndexResult};

const MAGIC: &[u8; 4] = b"RGVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Row count above which distances are computed on the rayon pool.
const PARALLEL_SCAN_ROWS: usize = 16_384;

/// Nearest-neighbor store over fixed-dimension vectors.
///
/// Search results are `(row, distance)` pairs in ascending distance order.
/// Implementations must break ties by the smaller row so results are
/// deterministic, and return at most `min(k, len())` pairs.
pub trait VectorIndex: Send + Sync {
    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors as new rows. Either all are appended or none.
    fn add(&mut self, vectors: &[Vec<f32>]) -> IndexResult<()>;

    fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<(usize, f32)>>;

    fn to_bytes(&self) -> Vec<u8>;
}

/// Brute-force squared-L2 index over a contiguous row-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Stored vector for a row.
    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Decode a blob produced by [`VectorIndex::to_bytes`].
    pub fn from_bytes(bytes: &[u8], path: &Path) -> IndexResult<Self> {
        let corrupt = |reason: String| IndexError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if bytes.len() < HEADER_LEN {
            return Err(corrupt(format!(
                "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(corrupt("bad magic bytes".to_string()));
        }

        let version = read_u32(&bytes[4..8]);
        if version != FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }
        let dimension = read_u32(&bytes[8..12]) as usize;
        let count = u64::from_le_bytes([
            bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
        ]);
        if dimension == 0 {
            return Err(corrupt("dimension is zero".to_string()));
        }

        let expected_len = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(dimension))
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| corrupt(format!("row count {count} overflows")))?;
        if bytes.len() != expected_len {
            return Err(corrupt(format!(
                "expected {expected_len} bytes for {count} rows of dimension {dimension}, found {}",
                bytes.len()
            )));
        }

        let data = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self { dimension, data })
    }

    /// Load a persisted index, or start empty if the file does not exist.
    ///
    /// A file that exists but cannot be decoded, or whose dimension differs
    /// from `dimension`, is an error.
    pub fn load(path: &Path, dimension: usize) -> IndexResult<Self> {
        if !path.exists() {
            tracing::info!(
                target: "index",
                "no index at {}, starting empty (dimension {dimension})",
                path.display()
            );
            return Ok(Self::new(dimension));
        }

        let bytes = std::fs::read(path).map_err(|source| IndexError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_bytes(&bytes, path)?;

        if index.dimension != dimension {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: index.dimension,
            });
        }

        tracing::debug!(
            target: "index",
            "loaded {} vectors from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Persist atomically.
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        crate::utils::write_atomic(path, &self.to_bytes()).map_err(|source| {
            IndexError::FileWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(
            target: "index",
            "saved {} vectors to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    fn distances(&self, query: &[f32]) -> Vec<(usize, f32)> {
        let score = |(row, v): (usize, &[f32])| (row, squared_l2(query, v));
        if self.len() >= PARALLEL_SCAN_ROWS {
            self.data
                .par_chunks_exact(self.dimension)
                .enumerate()
                .map(score)
                .collect()
        } else {
            self.data
                .chunks_exact(self.dimension)
                .enumerate()
                .map(score)
                .collect()
        }
    }
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension.max(1)
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> IndexResult<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        self.data.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = self.distances(query);
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_row);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_row);
        Ok(scored)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }
}

/// Squared Euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn by_distance_then_row(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn index_with(rows: &[[f32; 2]]) -> FlatL2Index {
        let mut index = FlatL2Index::new(2);
        let vectors: Vec<Vec<f32>> = rows.iter().map(|r| r.to_vec()).collect();
        index.add(&vectors).unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = index_with(&[[0.0, 0.0], [3.0, 4.0], [1.0, 0.0], [0.0, 2.0]]);
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits, vec![(0, 0.0), (2, 1.0), (3, 4.0)]);
    }

    #[test]
    fn test_distance_is_squared_l2() {
        let index = index_with(&[[3.0, 4.0]]);
        let hits = index.search(&[0.0, 0.0], 1).unwrap();
        assert_eq!(hits, vec![(0, 25.0)]);
    }

    #[test]
    fn test_ties_broken_by_smaller_row() {
        let index = index_with(&[[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [5.0, 5.0]]);
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let rows: Vec<_> = hits.iter().map(|h| h.0).collect();
        assert_eq!(rows, vec![0, 1, 2]);

        // same answer when k cuts through the tie
        let hits = index.search(&[0.0, 0.0], 2).unwrap();
        let rows: Vec<_> = hits.iter().map(|h| h.0).collect();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn test_top_k_bound() {
        let index = index_with(&[[0.0, 0.0], [1.0, 1.0]]);
        assert_eq!(index.search(&[0.0, 0.0], 10).unwrap().len(), 2);
        assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
        assert!(FlatL2Index::new(2).search(&[0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_wrong_dimension_atomically() {
        let mut index = index_with(&[[0.0, 0.0]]);
        let err = index
            .add(&[vec![1.0, 1.0], vec![1.0, 2.0, 3.0]])
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_query_dimension_checked() {
        let index = index_with(&[[0.0, 0.0]]);
        assert!(index.search(&[0.0], 1).is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.idx");
        let index = index_with(&[[0.25, -1.5], [1e-7, 3.0e8], [0.0, 0.0]]);

        index.save(&path).unwrap();
        let loaded = FlatL2Index::load(&path, 2).unwrap();

        assert_eq!(loaded, index);
        assert_eq!(
            loaded.search(&[0.2, -1.0], 3).unwrap(),
            index.search(&[0.2, -1.0], 3).unwrap()
        );
        assert_eq!(loaded.vector(1), Some(&[1e-7, 3.0e8][..]));
        assert_eq!(loaded.vector(3), None);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let index = FlatL2Index::load(&temp_dir.path().join("absent.idx"), 8).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 8);
    }

    #[test]
    fn test_load_dimension_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.idx");
        index_with(&[[1.0, 2.0]]).save(&path).unwrap();

        let err = FlatL2Index::load(&path, 3).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_corrupt_files_are_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.idx");

        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            FlatL2Index::load(&path, 2),
            Err(IndexError::Corrupt { .. })
        ));

        std::fs::write(&path, b"not an index at all, just text").unwrap();
        assert!(matches!(
            FlatL2Index::load(&path, 2),
            Err(IndexError::Corrupt { .. })
        ));

        // valid header, truncated body
        let mut bytes = index_with(&[[1.0, 2.0], [3.0, 4.0]]).to_bytes();
        bytes.truncate(bytes.len() - 3);
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(
            FlatL2Index::load(&path, 2),
            Err(IndexError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = index_with(&[[1.0, 2.0]]).to_bytes();
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            FlatL2Index::from_bytes(&bytes, Path::new("mem")),
            Err(IndexError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_parallel_scan_matches_sequential_order() {
        let rows = PARALLEL_SCAN_ROWS + 10;
        let mut index = FlatL2Index::new(2);
        let vectors: Vec<Vec<f32>> = (0..rows).map(|i| vec![(i % 97) as f32, 0.0]).collect();
        index.add(&vectors).unwrap();

        let hits = index.search(&[0.0, 0.0], 4).unwrap();
        // rows 0, 97, 194, 291 all sit at distance zero
        assert_eq!(
            hits,
            vec![(0, 0.0), (97, 0.0), (194, 0.0), (291, 0.0)]
        );
    }
}
