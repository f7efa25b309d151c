///
/// This module implements the CLI interface for file-search-sync: command parsing,
/// main entrypoints and user-visible output.
///
/// All reconciliation logic lives in the [`file-search-sync-core`] crate. This module
/// is CLI glue: it loads config, builds the one [`OpenAiClient`] for the run and
/// hands it to the core pipeline.
///
/// ## How To Use
/// - Run the binary without arguments to synchronise with the default config.
/// - `sync --config <file>` to point at a YAML config.
/// - `query "<question>"` to ask the synchronised index a question.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`file-search-sync-core`]: ../../file-search-sync-core/
use crate::client::OpenAiClient;
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use file_search_sync_core::persist::load_index_config;
use file_search_sync_core::query::ask;
use file_search_sync_core::synchronise::{synchronise, SyncReport};
use std::path::PathBuf;

/// CLI for file-search-sync: keep a remote file-search index in step with local posts.
#[derive(Parser)]
#[clap(
    name = "file-search-sync",
    version,
    about = "Upload markdown posts to a file-search vector store and keep it in sync"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload new posts, attach them to the index and wait for processing (the default)
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Ask a question against the synchronised index and print cited files
    Query {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Index record to read; defaults to the configured output path
        #[clap(long)]
        index_config: Option<PathBuf>,
        /// The question to ask
        text: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command.unwrap_or(Commands::Sync { config: None }) {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "sync", "Starting synchronisation process");
            let client = OpenAiClient::new(&config.client)
                .map_err(|e| anyhow::anyhow!("Failed to construct client: {e}"))?;

            println!("Synchronise starting...");
            match synchronise(&config.sync, &client, &client).await {
                Ok(report) => {
                    tracing::info!(command = "sync", index_id = %report.index.id, "Synchronisation complete");
                    print_report(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e).context("Synchronisation failed"))
                }
            }
        }
        Commands::Query {
            config,
            index_config,
            text,
        } => {
            let config = load_config(config)?;
            let record_path = index_config.unwrap_or_else(|| config.sync.output_path.clone());
            let record = load_index_config(&record_path).with_context(|| {
                format!(
                    "No index config at {}; run `sync` first",
                    record_path.display()
                )
            })?;
            let client = OpenAiClient::new(&config.client)
                .map_err(|e| anyhow::anyhow!("Failed to construct client: {e}"))?;

            println!("Testing file search with query: {text}");
            let answer = ask(&client, &text, &[record.vector_store_id])
                .await
                .map_err(|e| anyhow::anyhow!("Query failed: {e}"))?;

            println!("\n=== Message Content ===\n{}", answer.text);
            if !answer.citations.is_empty() {
                println!("\n=== File Citations ===");
                for citation in &answer.citations {
                    println!("- File: {} (ID: {})", citation.filename, citation.file_id);
                }
            }
            Ok(())
        }
    }
}

fn print_report(report: &SyncReport) {
    println!("Synchronise complete.");
    println!(
        "Index: {} (ID: {}){}",
        report.index.name,
        report.index.id,
        if report.index_created { " [created]" } else { "" }
    );
    println!(
        "Files: {} uploaded, {} already present, {} skipped",
        report.uploaded.len(),
        report.reused.len(),
        report.skipped.len()
    );
    println!("Members added: {}", report.members_added.len());
    let counts = &report.processing.counts;
    println!(
        "Processing: {} completed, {} failed, {} total",
        counts.completed, counts.failed, counts.total
    );
    if !report.processing.failed_ids.is_empty() {
        println!("Failed files: {:?}", report.processing.failed_ids);
    }
    println!("Configuration saved to {}", report.output_path.display());
}
