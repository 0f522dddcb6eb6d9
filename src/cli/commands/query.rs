//! Query command.

use anyhow::Context;

use crate::config::Settings;
use crate::pipeline::RagSession;

/// Longest chunk preview printed in text mode.
const PREVIEW_CHARS: usize = 240;

/// Run query command - print the nearest chunks.
pub fn run(settings: &Settings, text: &str, k: Option<usize>, json: bool) -> anyhow::Result<()> {
    let session = RagSession::from_settings(settings).context("Failed to open corpus")?;
    let hits = session.query(text, k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        eprintln!("No results found.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let record = &hit.record;
        println!(
            "\n{}. {} (distance: {:.4})",
            i + 1,
            record.chunk_id,
            hit.distance
        );
        if let Some(name) = &record.source_name {
            println!("   Source: {name}");
        }
        println!("   Tokens: {}..{}", record.start_token, record.end_token);
        println!("   {}", preview(&record.text));
    }
    Ok(())
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("a\n\nb   c"), "a b c");
        let long = "x".repeat(PREVIEW_CHARS + 10);
        let p = preview(&long);
        assert_eq!(p.len(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
    }
}
