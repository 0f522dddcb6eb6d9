//! Document sources feeding the ingestion pipeline.
//!
//! A source is any provider that can hand over a batch of [`Document`]s.
//! Connectors for remote systems live outside this crate; they only need to
//! produce the same `{id, name, mime_type, text}` shape, for example as a
//! JSON lines file read by [`JsonlSource`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::types::Document;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot read source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed under {path}: {reason}")]
    Walk { path: PathBuf, reason: String },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Anything that can produce documents for ingestion.
///
/// Per-document extraction failures are not errors: the document is returned
/// with empty text (and logged) so that the rest of the batch still ingests.
pub trait DocumentSource {
    /// Name used in logs.
    fn describe(&self) -> String;

    /// Fetch all documents currently available from this source.
    fn fetch(&self) -> SourceResult<Vec<Document>>;
}

/// In-memory documents, mostly for programmatic callers and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: Vec<Document>,
}

impl StaticSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl DocumentSource for StaticSource {
    fn describe(&self) -> String {
        format!("static ({} documents)", self.documents.len())
    }

    fn fetch(&self) -> SourceResult<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// File extensions read as text, with the mime type reported for them.
const TEXT_EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("rst", "text/x-rst"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("html", "text/html"),
    ("htm", "text/html"),
];

/// Mime type for a path, if its extension is one we read as text.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    TEXT_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Text files under a directory, walked in sorted order.
///
/// Document ids are paths relative to the root, so re-running over the same
/// tree yields the same ids.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    follow_links: bool,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: false,
        }
    }

    /// Descend into symlinked directories and read symlinked files.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Unreadable files come back with empty text, which ingestion skips.
    pub(crate) fn read_document(&self, path: &Path, mime: &str) -> Document {
        let id = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());

        let text = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(target: "source", "failed to read {}: {e}", path.display());
                String::new()
            }
        };

        Document::new(id, name, Some(mime.to_string()), text)
    }
}

impl DocumentSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn fetch(&self) -> SourceResult<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(SourceError::Unreadable {
                path: self.root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // The root itself failing is fatal; anything below is skipped.
                    if e.depth() == 0 {
                        return Err(SourceError::Walk {
                            path: self.root.clone(),
                            reason: e.to_string(),
                        });
                    }
                    tracing::warn!(target: "source", "skipping entry: {e}");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(mime) = mime_for_path(entry.path()) else {
                tracing::trace!(target: "source", "ignoring {}", entry.path().display());
                continue;
            };
            documents.push(self.read_document(entry.path(), mime));
        }

        tracing::debug!(
            target: "source",
            "{} documents from {}",
            documents.len(),
            self.root.display()
        );
        Ok(documents)
    }
}

/// JSON lines file with one `{id, name, mime_type, text}` object per line.
///
/// Blank lines are ignored. A line that does not parse is logged and skipped.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for JsonlSource {
    fn describe(&self) -> String {
        format!("jsonl {}", self.path.display())
    }

    fn fetch(&self) -> SourceResult<Vec<Document>> {
        let unreadable = |source| SourceError::Unreadable {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).map_err(unreadable)?;

        let mut documents = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(unreadable)?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Document>(&line) {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!(
                    target: "source",
                    "{}:{}: skipping malformed record: {e}",
                    self.path.display(),
                    line_no + 1
                ),
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b.MD")), Some("text/markdown"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), Some("text/plain"));
        assert_eq!(mime_for_path(Path::new("image.png")), None);
        assert_eq!(mime_for_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_directory_source_reads_text_files_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("guides")).unwrap();
        fs::write(root.join("b.txt"), "bravo").unwrap();
        fs::write(root.join("a.md"), "# alpha").unwrap();
        fs::write(root.join("guides/c.md"), "charlie").unwrap();
        fs::write(root.join("skip.bin"), [0u8, 1, 2]).unwrap();

        let docs = DirectorySource::new(root).fetch().unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.md", "b.txt", "guides/c.md"]);
        assert_eq!(docs[0].mime_type.as_deref(), Some("text/markdown"));
        assert_eq!(docs[1].name.as_deref(), Some("b.txt"));
        assert_eq!(docs[2].text, "charlie");
    }

    #[test]
    fn test_unreadable_file_becomes_blank_document() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let doc = DirectorySource::new(root).read_document(&root.join("gone.txt"), "text/plain");
        assert_eq!(doc.id, "gone.txt");
        assert_eq!(doc.name.as_deref(), Some("gone.txt"));
        assert_eq!(doc.mime_type.as_deref(), Some("text/plain"));
        assert!(doc.text.is_empty());
        assert!(doc.is_blank());
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_source_follow_links() {
        let temp_dir = TempDir::new().unwrap();
        let shared = temp_dir.path().join("shared");
        let root = temp_dir.path().join("root");
        fs::create_dir_all(&shared).unwrap();
        fs::create_dir_all(&root).unwrap();
        fs::write(shared.join("faq.txt"), "linked").unwrap();
        fs::write(root.join("own.txt"), "local").unwrap();
        std::os::unix::fs::symlink(&shared, root.join("shared")).unwrap();

        let ids = |source: DirectorySource| -> Vec<String> {
            source.fetch().unwrap().into_iter().map(|d| d.id).collect()
        };
        assert_eq!(ids(DirectorySource::new(&root)), vec!["own.txt"]);
        assert_eq!(
            ids(DirectorySource::new(&root).follow_links(true)),
            vec!["own.txt", "shared/faq.txt"]
        );
    }

    #[test]
    fn test_directory_source_missing_root() {
        let err = DirectorySource::new("/definitely/not/here").fetch().unwrap_err();
        assert!(matches!(err, SourceError::Unreadable { .. }));
    }

    #[test]
    fn test_jsonl_source_skips_malformed_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs.jsonl");
        fs::write(
            &path,
            concat!(
                "{\"id\":\"d1\",\"name\":\"One\",\"mime_type\":\"text/plain\",\"text\":\"first\"}\n",
                "\n",
                "not json\n",
                "{\"id\":\"d2\",\"text\":\"\"}\n",
            ),
        )
        .unwrap();

        let docs = JsonlSource::new(&path).fetch().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "d1");
        assert_eq!(docs[0].mime_type.as_deref(), Some("text/plain"));
        assert_eq!(docs[1].id, "d2");
        assert!(docs[1].name.is_none());
        assert!(docs[1].is_blank());
    }

    #[test]
    fn test_jsonl_source_missing_file() {
        let err = JsonlSource::new("/no/such/file.jsonl").fetch().unwrap_err();
        assert!(matches!(err, SourceError::Unreadable { .. }));
    }

    #[test]
    fn test_static_source() {
        let source = StaticSource::new(vec![Document::from_text("x", "hello")]);
        assert_eq!(source.fetch().unwrap().len(), 1);
        assert!(source.describe().contains("1 documents"));
    }
}
