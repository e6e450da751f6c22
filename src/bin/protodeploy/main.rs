//! protodeploy CLI

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use protodeploy::ops::deploy;
use protodeploy::util::config::load_config;
use protodeploy::util::SystemRunner;

mod cli;

use cli::Cli;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let default_filter = if cli.verbose {
        "protodeploy=debug"
    } else {
        "protodeploy=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .without_time()
        .init();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to determine the current directory")?,
    };
    let root = root.canonicalize().unwrap_or(root);

    let mut config = load_config(&root, cli.config.as_deref())?;
    if let Some(jobs) = cli.jobs {
        config = config.with_jobs(jobs)?;
    }

    let report = deploy(&root, &config, &SystemRunner)
        .with_context(|| format!("failed to discover packages in {}", root.display()))?;

    // Partial failures are only visible in the log; the exit code stays 0.
    let failed = report.failures().count();
    if failed > 0 {
        tracing::warn!(
            "Finished {} package(s) with {} failed target(s)",
            report.packages,
            failed
        );
    } else {
        tracing::info!(
            "Finished {} package(s), {} deployed",
            report.packages,
            report.deployed().count()
        );
    }

    Ok(())
}
