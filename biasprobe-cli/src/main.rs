//! Biasprobe CLI — run demographic bias probes against a RAG assistant.
//!
//! With an API key configured the probe queries the live service; without
//! one it falls back to the deterministic synthetic generator, so the
//! full pipeline stays runnable offline.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use biasprobe_core::{
    ProbeRunner, ResponseCache, default_groupings, load_config, report, test_profiles,
    test_queries,
};

/// Biasprobe: demographic bias probing for RAG assistants
#[derive(Parser, Debug)]
#[command(name = "biasprobe", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the full probe and write the analysis tables
    Run {
        /// Path for the statistical results table
        #[arg(long, default_value = "bias_stats.csv")]
        stats_csv: PathBuf,
        /// Only print comparisons flagged significant
        #[arg(long)]
        significant_only: bool,
    },
    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show the built-in probe catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum CacheAction {
    /// Show entry count and on-disk size
    Stats,
    /// Delete every cached response
    Clear,
}

#[derive(clap::Subcommand, Debug)]
enum CatalogAction {
    /// List the synthetic user profiles
    Profiles,
    /// List the probe queries
    Queries,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run {
            stats_csv,
            significant_only,
        } => run_probe(&config, &stats_csv, significant_only).await,
        Commands::Cache { action } => handle_cache(&config, action),
        Commands::Catalog { action } => {
            handle_catalog(action);
            Ok(())
        }
    }
}

async fn run_probe(
    config: &biasprobe_core::ProbeConfig,
    stats_csv: &PathBuf,
    significant_only: bool,
) -> anyhow::Result<()> {
    let mut runner = ProbeRunner::from_config(config).context("Failed to initialize probe")?;
    let profiles = test_profiles();
    let queries = test_queries();
    let groupings = default_groupings();

    let run = runner
        .run(&profiles, &queries, &groupings)
        .await
        .context("Probe run failed")?;

    report::write_records_csv(&config.report.output_csv, &run.records)
        .context("Failed to write analysis table")?;
    report::write_results_csv(stats_csv, &run.results)
        .context("Failed to write results table")?;

    println!("{}", run.summary());
    for failure in &run.failures {
        println!(
            "  failed: {} / {:40} {}",
            failure.profile, failure.query, failure.error
        );
    }

    println!();
    for result in &run.results {
        if result.skip_reason.is_some() {
            continue;
        }
        if significant_only && !result.significant {
            continue;
        }
        let marker = if result.significant { "*" } else { " " };
        println!(
            "{marker} {:<20} {:<28} {:<8} p={}",
            result.dimension,
            result.feature,
            result.test_name,
            result
                .p_value
                .map(|p| format!("{p:.4}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    Ok(())
}

fn handle_cache(config: &biasprobe_core::ProbeConfig, action: CacheAction) -> anyhow::Result<()> {
    let store = config.cache.store_path();
    let mut cache = ResponseCache::open(&store);
    match action {
        CacheAction::Stats => {
            println!("store:   {}", store.display());
            println!("entries: {}", cache.entry_count());
            println!("size:    {} bytes", cache.size_on_disk());
            if cache.is_degraded() {
                println!("status:  degraded (store unreadable, in-memory only)");
            }
        }
        CacheAction::Clear => {
            let count = cache.entry_count();
            cache.clear();
            println!("Removed {count} cached responses");
        }
    }
    Ok(())
}

fn handle_catalog(action: CatalogAction) {
    match action {
        CatalogAction::Profiles => {
            for profile in test_profiles() {
                let pronouns = if profile.pronouns.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", profile.pronouns)
                };
                println!(
                    "{:<22}{pronouns:<12} {:<28} {:<16} {}",
                    profile.name, profile.title, profile.department, profile.location
                );
            }
        }
        CatalogAction::Queries => {
            for query in test_queries() {
                println!("{:<24} {}", query.bias_dimension, query.text);
            }
        }
    }
}
