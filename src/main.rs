//! filecache - command-line access to a filesystem-backed object cache
//!
//! filecache provides:
//! - get/set/add/replace/delete and counters against the on-disk layout
//! - Flushing (whole cache or one group) and expiry sweeps
//! - Per-group disk census
//! - Drop-in activation for a host directory
//! - Unified output format (jsonl/json/raw)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if !cli::run(cli)? {
        std::process::exit(1);
    }
    Ok(())
}
