//! Chain driver (chainweave-fab) - Main entry point
//!
//! Loads a TOML fixture of chains into an in-memory store and fabricates
//! every planned segment, one blocking worker per chain.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chainweave_common::config::{load_settings, CONFIG_ENV_VAR};
use chainweave_fab::driver::{fabricate_chains, ChainReport};
use chainweave_fab::store::{Fixture, HashedKeyGenerator};
use chainweave_fab::Collaborators;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Command-line arguments for chainweave-fab
#[derive(Parser, Debug)]
#[command(name = "chainweave-fab")]
#[command(about = "Fabricate planned segments of fixture chains")]
#[command(version)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, env = "CHAINWEAVE_CONFIG")]
    config: Option<PathBuf>,

    /// Fixture of chains, segments, and catalog (TOML)
    #[arg(short, long)]
    fixture: PathBuf,

    /// Only fabricate these chains (repeatable)
    #[arg(long = "chain")]
    chains: Vec<Uuid>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn print_plain(reports: &[ChainReport]) {
    for report in reports {
        println!("chain {}", report.chain_id);
        for outcome in &report.outcomes {
            match &outcome.error {
                None => println!(
                    "  [{}] {} {} {}",
                    outcome.offset,
                    outcome
                        .segment_type
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    outcome
                        .seconds
                        .map(|s| format!("{:.3}s", s))
                        .unwrap_or_else(|| "-".to_string()),
                    outcome.waveform_key.as_deref().unwrap_or("-"),
                ),
                Some(e) => println!("  [{}] failed: {}", outcome.offset, e),
            }
        }
        if let Some(reason) = &report.halted {
            println!("  halted: {}", reason);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref(), CONFIG_ENV_VAR);

    // Initialize tracing
    let default_filter = format!(
        "chainweave_fab={level},chainweave_common={level}",
        level = settings.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Settings: {} frames/beat, {} Hz resolution, temp prefix {}",
        settings.frames_per_beat, settings.resolution_hz, settings.temp_file_path_prefix
    );

    let fixture = Fixture::load(&args.fixture)
        .with_context(|| format!("Failed to load fixture {}", args.fixture.display()))?;
    let store = Arc::new(fixture.into_store().context("Failed to load fixture into store")?);

    let chain_ids = if args.chains.is_empty() {
        store.chain_ids()
    } else {
        let known = store.chain_ids();
        if let Some(unknown) = args.chains.iter().find(|id| !known.contains(id)) {
            bail!("Chain {} is not in the fixture", unknown);
        }
        args.chains.clone()
    };
    info!("Fabricating {} chains", chain_ids.len());

    let collaborators = Collaborators::new(
        store.clone(),
        store,
        Arc::new(HashedKeyGenerator),
        Arc::new(settings),
    );
    let reports = fabricate_chains(collaborators, chain_ids).await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialize results")?
        );
    } else {
        print_plain(&reports);
    }

    let halted = reports.iter().filter(|r| r.halted.is_some()).count();
    info!("Done: {} chains, {} halted", reports.len(), halted);
    Ok(())
}
