//! Ingest command.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::config::Settings;
use crate::documents::{DirectorySource, DocumentSource, JsonlSource};
use crate::pipeline::{IngestProgress, NoProgress, RagSession};

/// Terminal progress for an ingest: a spinner while chunking, a bar while embedding.
struct TerminalProgress {
    chunking: ProgressBar,
    embedding: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new() -> Self {
        let chunking = ProgressBar::new_spinner();
        chunking.set_style(
            ProgressStyle::with_template("{spinner:.green} chunking {pos} documents {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self {
            chunking,
            embedding: None,
        }
    }

    fn finish(&self) {
        self.chunking.finish_and_clear();
        if let Some(bar) = &self.embedding {
            bar.finish_and_clear();
        }
    }
}

impl IngestProgress for TerminalProgress {
    fn on_document(&mut self, doc_id: &str, _chunks: usize) {
        self.chunking.inc(1);
        self.chunking.set_message(doc_id.to_string());
    }

    fn on_embedded(&mut self, done: usize, total: usize) {
        let bar = self.embedding.get_or_insert_with(|| {
            self.chunking.finish_and_clear();
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template(
                    "embedding [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            );
            bar
        });
        bar.set_position(done as u64);
    }
}

/// Run ingest command - fetch, chunk, embed, append and flush.
pub fn run(
    settings: &Settings,
    dir: Option<PathBuf>,
    jsonl: Option<PathBuf>,
    follow_links: bool,
    no_progress: bool,
) -> anyhow::Result<()> {
    let source: Box<dyn DocumentSource> = match (dir, jsonl) {
        (Some(dir), _) => Box::new(DirectorySource::new(dir).follow_links(follow_links)),
        (None, Some(path)) => Box::new(JsonlSource::new(path)),
        (None, None) => anyhow::bail!("either --dir or --jsonl is required"),
    };

    let session = RagSession::from_settings(settings).context("Failed to open corpus")?;

    let stats = if no_progress {
        session.ingest_source(source.as_ref(), &mut NoProgress)?
    } else {
        let mut progress = TerminalProgress::new();
        let result = session.ingest_source(source.as_ref(), &mut progress);
        progress.finish();
        result?
    };

    session.flush().context("Failed to flush corpus")?;
    crate::log_event!("ingest", "flushed", "{} rows", session.len());

    println!(
        "Ingested {} documents ({} blank, skipped) into {} chunks",
        stats.documents_seen, stats.documents_skipped, stats.chunks_created
    );
    println!(
        "Corpus now holds {} chunks in {}",
        session.len(),
        settings.data_dir.display()
    );
    Ok(())
}
