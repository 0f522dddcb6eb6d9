//! ragcore command-line entry point.

use clap::Parser;

use ragcore::Settings;
use ragcore::cli::commands;
use ragcore::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init runs before any settings file exists
    if let Commands::Init { force } = &cli.command {
        ragcore::logging::init();
        return commands::init::run_init(cli.config.as_deref(), *force);
    }

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    ragcore::logging::init_with_config(&settings.logging);
    ragcore::debug_event!(
        "cli",
        "settings loaded",
        "data_dir={}",
        settings.data_dir.display()
    );

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Ingest {
            dir,
            jsonl,
            follow_links,
            no_progress,
        } => commands::ingest::run(&settings, dir, jsonl, follow_links, no_progress),
        Commands::Query { text, k, json } => commands::query::run(&settings, &text, k, json),
        Commands::Stats { json } => commands::stats::run(&settings, json),
        Commands::Config => commands::init::run_config(&settings),
    }
}
