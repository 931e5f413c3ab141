//! src/bin/chain_smoke.rs
//! Launch a chain of nodes, give them time to start, probe the last one.
//! Run: cargo run --bin chain-smoke -- [--config harness.yaml]
//!
//! Without a configured `program`, the `chain-node` built next to this binary
//! is launched. When it is missing the harness falls back on `cargo run`,
//! which must be started from the crate root and may outlast the launch
//! delays on a cold build.
//!
//! stdout carries only the response lines; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use daisy_chain::{
    config::{self, HarnessConfig},
    harness::{self, Harness},
    launcher::ProcessSpawner,
    logging,
};

#[derive(Parser, Debug)]
#[command(name = "chain-smoke", version, about)]
struct Args {
    /// Harness configuration (YAML or JSON). Built-in defaults otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll each instance's health endpoint before probing.
    #[arg(long)]
    readiness: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            config::load_config(path).await?
        }
        None => HarnessConfig::default(),
    };
    if args.readiness {
        config.readiness.enabled = true;
    }

    let harness = Harness::new(config, ProcessSpawner::new());
    let report = harness.run().await.context("smoke test failed")?;

    let failed = report.launches.iter().filter(|l| l.error.is_some()).count();
    if failed > 0 {
        info!("{} of {} launches failed", failed, report.launches.len());
    }

    harness::write_lines(&report.response.lines, std::io::stdout().lock())
        .context("Failed to write probe output")?;

    Ok(())
}
