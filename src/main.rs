//! relic - fast shell completion for remote cloud resources
//!
//! relic answers completion queries from a hierarchical file-backed cache
//! and only falls back to the (slow, rate-limited) remote list command on a
//! miss, with a watchdog bounding how long that fallback may run.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backends;
mod cache;
mod cli;
mod core;
mod flows;

fn main() -> Result<()> {
    // The watchdog's process-group signalling and the fd 9 tick channel
    // are POSIX-only.
    #[cfg(windows)]
    {
        eprintln!("Error: Windows is not supported. Please use WSL (not guaranteed to work).");
        std::process::exit(1);
    }

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RELIC_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(cli)
}
