use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use huntarr_core::{
    load_config, validate_config, AppKind, CycleReport, HuntKind, HuntOrchestrator,
    SanitizedConfig,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run one hunt cycle against the configured Sonarr and Radarr instances.
#[derive(Parser, Debug)]
#[command(name = "huntarr", version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML, or TOML by extension)
    #[arg(short, long, env = "HUNTARR_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Log what would be searched without triggering searches or writing the ledger
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug,hyper=warn,hyper_util=warn,reqwest=warn"
    } else {
        "info,hyper=warn,hyper_util=warn,reqwest=warn"
    }
}

/// `--verbose` wins over `RUST_LOG`; otherwise `RUST_LOG` wins over the default.
fn build_filter(args: &Args) -> EnvFilter {
    if args.verbose {
        return EnvFilter::new(default_filter(true));
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(false)))
}

fn init_logging(args: &Args) {
    let filter = build_filter(args);

    let json = args.json_logs.then(|| tracing_subscriber::fmt::layer().json());
    let text = (!args.json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

async fn run(args: Args) -> Result<()> {
    info!("huntarr v{}", VERSION);

    info!("Loading configuration from {:?}", args.config);
    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Ledger database: {:?}", config.state.database);
    tracing::debug!(config = ?SanitizedConfig::from(&config), "Effective configuration");

    if config.sonarr.is_empty() && config.radarr.is_empty() {
        warn!("No Sonarr or Radarr instances configured");
    }

    if args.dry_run {
        info!("=== DRY RUN: no searches will be triggered and the ledger is left untouched ===");
    }

    let mut orchestrator = HuntOrchestrator::new(config).with_dry_run(args.dry_run);
    let report = orchestrator
        .run_cycle()
        .await
        .context("Hunt cycle failed")?;

    log_summary(&report);
    Ok(())
}

fn log_summary(report: &CycleReport) {
    for app in AppKind::ALL {
        for kind in HuntKind::ALL {
            let tally = report.tally(app, kind);
            info!(
                found = tally.total_records,
                eligible = tally.eligible,
                selected = tally.selected,
                failed = tally.trigger_failures + tally.ledger_failures,
                "{} {} searched: {}",
                app.display_name(),
                kind,
                tally.searched
            );
        }
    }

    if report.dry_run {
        info!(
            "Dry run: {} items would have been searched",
            report.total_selected()
        );
    }
    info!(
        purged = report.purged,
        processed = report.instances_processed,
        skipped = report.instances_skipped,
        "Run complete"
    );
}
