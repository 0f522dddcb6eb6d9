//! Stats command.

use crate::config::Settings;
use crate::storage::CorpusPersistence;

/// Run stats command - summarize the persisted corpus without loading a model.
pub fn run(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let persistence = CorpusPersistence::new(&settings.data_dir);
    let corpus = persistence.load(settings.embedding.dimension)?;
    let manifest = persistence.load_manifest()?;

    if json {
        let value = serde_json::json!({
            "data_dir": settings.data_dir,
            "rows": corpus.len(),
            "documents": corpus.metadata().document_count(),
            "dimension": corpus.dimension(),
            "manifest": manifest,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Corpus: {}", settings.data_dir.display());
    println!("  Chunks:    {}", corpus.len());
    println!("  Documents: {}", corpus.metadata().document_count());
    println!("  Dimension: {}", corpus.dimension());
    match manifest {
        Some(m) => {
            println!("  Model:     {}", m.model);
            println!("  Flushed:   {}", format_timestamp(m.last_modified));
        }
        None => println!("  Nothing flushed yet"),
    }
    Ok(())
}

fn format_timestamp(secs: u64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
