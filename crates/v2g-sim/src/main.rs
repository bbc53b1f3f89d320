//! v2g-sim - ISO 15118-20 EVSE scenario runner
//!
//! Drives a `v2g-d20` session from a JSON scenario instead of a live vehicle
//! connection. Time is virtual, so timeout scenarios run instantly.
//!
//! # Usage
//!
//! ```bash
//! v2g-sim --config config/evse.toml crates/v2g-sim/scenarios/ac_scheduled.json
//! ```
//!
//! Each response, expired timeout and feedback event is printed to stdout as
//! one JSON line; logs go to stderr.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use v2g_d20::{EvseSetupConfig, SessionConfig};

mod scenario;

use scenario::{Runner, Scenario};

#[derive(Parser, Debug)]
#[command(name = "v2g-sim")]
#[command(about = "Run ISO 15118-20 EVSE session scenarios")]
struct Args {
    /// EVSE setup configuration (TOML)
    #[arg(short, long, default_value = "config/evse.toml")]
    config: String,

    /// Scenario file (JSON)
    scenario: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(args: &Args) {
    let default_filter = if args.verbose {
        "v2g_sim=debug,v2g_d20=debug"
    } else {
        "v2g_sim=info,v2g_d20=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    info!("Loading config from: {}", args.config);
    let setup = EvseSetupConfig::load(&args.config)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    let session_config = SessionConfig::new(setup);

    let scenario = Scenario::load(&args.scenario).await?;
    let mut runner = Runner::new(&scenario, session_config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = runner.run(&scenario.steps, &mut out)?;

    info!(
        responses = summary.responses,
        stopped = summary.stopped,
        virtual_time_ms = summary.virtual_time.as_millis() as u64,
        "Done"
    );
    Ok(())
}
