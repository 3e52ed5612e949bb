//! docwatch CLI
//!
//! Checks documentation sources for changes and reports them.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docwatch::{
    config::{Overrides, load_config},
    error::Result,
    models::{AdapterConfig, ChangeSet},
    pipeline,
    services::AdapterRegistry,
    storage::{LocalStorage, SnapshotStorage},
};
use serde::Serialize;

/// docwatch - Documentation Change Monitor
#[derive(Parser, Debug)]
#[command(
    name = "docwatch",
    version,
    about = "Watch API documentation for changes"
)]
struct Cli {
    /// Path to configuration file (default: ./docwatch.toml if present)
    #[arg(short, long, env = "DOCWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check sources for changes (all sources when none are given)
    Check {
        /// Source names
        sources: Vec<String>,

        /// Directory holding the per-source state files
        #[arg(long)]
        state_dir: Option<String>,

        /// State file for a single source
        #[arg(long)]
        storage_file: Option<String>,

        /// Maximum pages to crawl per crawled source
        #[arg(long)]
        max_pages: Option<usize>,

        /// Save full content for detailed diffs
        #[arg(long)]
        save_content: bool,

        /// Disable notifications
        #[arg(long)]
        no_notify: bool,

        /// Telegram bot token
        #[arg(long, env = "DOCWATCH_TELEGRAM_TOKEN", hide_env_values = true)]
        telegram_token: Option<String>,

        /// Telegram chat id
        #[arg(long, env = "DOCWATCH_TELEGRAM_CHAT_ID")]
        telegram_chat_id: Option<String>,

        /// Print the change sets as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List configured sources
    List,

    /// Validate configuration
    Validate,

    /// Show configuration and stored snapshot of a source
    Info {
        /// Source name
        source: String,
    },
}

/// JSON shape of one source in `check --json`.
#[derive(Serialize)]
struct JsonOutcome<'a> {
    source: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<&'a ChangeSet>,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Check {
            sources,
            state_dir,
            storage_file,
            max_pages,
            save_content,
            no_notify,
            telegram_token,
            telegram_chat_id,
            json,
        } => {
            let overrides = Overrides {
                state_dir,
                storage_file,
                max_pages,
                save_content,
                no_notify,
                telegram_token,
                telegram_chat_id,
            };
            overrides.apply(&mut config, &sources)?;
            config.validate()?;

            let registry = AdapterRegistry::from_config(&config)?;
            let outcomes = pipeline::run_sources(&config, &registry, &sources).await?;
            let all_ok = pipeline::print_final_summary(&outcomes);

            if json {
                let report: Vec<JsonOutcome<'_>> = outcomes
                    .iter()
                    .map(|o| JsonOutcome {
                        source: &o.name,
                        success: o.is_success(),
                        error: o.result.as_ref().err().map(|e| e.to_string()),
                        changes: o.result.as_ref().ok().map(|r| &r.changes),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&report)?);
            }

            if !all_ok {
                std::process::exit(1);
            }
        }

        Command::List => {
            for source in &config.sources {
                let kind = match &source.adapter {
                    AdapterConfig::Enumerated(_) => "enumerated",
                    AdapterConfig::Crawled(_) => "crawled",
                };
                println!("{:<14} {:<11} {}", source.name, kind, source.base_url);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            AdapterRegistry::from_config(&config)?;
            log::info!("✓ Config OK ({} sources)", config.sources.len());
        }

        Command::Info { source } => {
            let source = config.source(&source)?;
            let path = config.state_path(source);
            log::info!("Source: {} ({})", source.label(), source.name);
            log::info!("Docs: {}", source.base_url);
            log::info!("State file: {}", path.display());

            match LocalStorage::new(&path).load_snapshot().await? {
                Some(snapshot) => {
                    log::info!("Last check: {}", snapshot.timestamp);
                    log::info!("Tracked units: {}", snapshot.units.len());
                    let with_content = snapshot
                        .units
                        .values()
                        .filter(|u| u.content.is_some())
                        .count();
                    if with_content > 0 {
                        log::info!("Units with saved content: {}", with_content);
                    }
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    Ok(())
}
