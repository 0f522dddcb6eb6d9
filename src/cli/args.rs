//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Chunking, embedding and nearest-chunk retrieval
#[derive(Parser, Debug)]
#[command(
    name = "ragcore",
    version = env!("CARGO_PKG_VERSION"),
    about = "Chunk, embed and retrieve documents",
    long_about = "Split documents into overlapping token windows, embed them, and retrieve the nearest chunks for a query.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ ragcore init\n  $ ragcore ingest --dir ./docs\n  $ ragcore query \"how do refunds work\" -k 3"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .ragcore directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Ingest documents and flush the corpus to disk
    #[command(
        about = "Chunk, embed and store documents",
        after_help = "Examples:\n  ragcore ingest --dir ./docs\n  ragcore ingest --jsonl export.jsonl --no-progress\n\nJSON lines records:\n  {\"id\": \"...\", \"name\": \"...\", \"mime_type\": \"...\", \"text\": \"...\"}"
    )]
    Ingest {
        /// Directory of text files to ingest
        #[arg(long, value_name = "DIR", conflicts_with = "jsonl", required_unless_present = "jsonl")]
        dir: Option<PathBuf>,

        /// JSON lines file with one document per line
        #[arg(long, value_name = "FILE")]
        jsonl: Option<PathBuf>,

        /// Follow symbolic links while walking --dir
        #[arg(long, requires = "dir")]
        follow_links: bool,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Retrieve the chunks nearest to a query
    #[command(about = "Find the nearest chunks for a query")]
    Query {
        /// Query text
        text: String,

        /// Number of chunks to return (defaults to query.default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show corpus statistics
    #[command(about = "Show row, document and model information for the stored corpus")]
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .ragcore/settings.toml")]
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ingest_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["ragcore", "ingest"]).is_err());
        assert!(
            Cli::try_parse_from(["ragcore", "ingest", "--dir", "a", "--jsonl", "b"]).is_err()
        );

        let cli = Cli::try_parse_from(["ragcore", "ingest", "--jsonl", "docs.jsonl"]).unwrap();
        match cli.command {
            Commands::Ingest { dir, jsonl, .. } => {
                assert!(dir.is_none());
                assert_eq!(jsonl, Some(PathBuf::from("docs.jsonl")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_ingest_follow_links_needs_dir() {
        let cli =
            Cli::try_parse_from(["ragcore", "ingest", "--dir", "docs", "--follow-links"]).unwrap();
        match cli.command {
            Commands::Ingest { follow_links, .. } => assert!(follow_links),
            other => panic!("unexpected command {other:?}"),
        }

        assert!(
            Cli::try_parse_from(["ragcore", "ingest", "--jsonl", "d.jsonl", "--follow-links"])
                .is_err()
        );
    }

    #[test]
    fn test_query_with_global_config() {
        let cli =
            Cli::try_parse_from(["ragcore", "query", "refund policy", "-k", "3", "-c", "x.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Commands::Query { text, k, json } => {
                assert_eq!(text, "refund policy");
                assert_eq!(k, Some(3));
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
