//! CLI module - command-line interface definitions and handlers

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CompletionCache;
use crate::core::paths::completion_cache_dir;
use crate::core::registry::Registry;

/// relic - fast shell completion for remote cloud resources.
#[derive(Parser, Debug)]
#[command(name = "relic")]
#[command(
    author,
    version,
    about,
    long_about = r#"relic serves completion candidates for remotely-managed resources
(instances, zones, databases, ...) from a local file-backed cache.

On a cache miss it falls back to the family's configured list command,
guarded by a watchdog that renders a spinner and enforces a hard timeout,
then repopulates the cache for subsequent completions. Candidates are
printed one per line on stdout; spinner ticks go to fd 9 when the shell
provides one, stderr otherwise.

Examples:
    relic complete compute.instances --param project=my-proj --prefix web
    relic complete compute.instances --param project=my-proj --line "gcloud compute instances describe we"
    relic cache add https://www.googleapis.com/compute/v1/projects/my-proj/zones/us-east1-b/instances/web-1
    relic cache status
    relic families
"#
)]
pub struct Cli {
    /// Cache directory (defaults to ~/.cache/relic/completion_cache).
    #[arg(
        long,
        global = true,
        env = "RELIC_CACHE_DIR",
        value_name = "DIR",
        long_help = "Root directory of the completion cache.\n\n\
Defaults to $RELIC_CACHE_DIR, then ~/.cache/relic/completion_cache. Each\n\
hierarchy level of a resource identity becomes one directory level below\n\
this root."
    )]
    pub cache_dir: Option<PathBuf>,

    /// Registry config file (JSON) merged over the builtin families.
    #[arg(
        long,
        global = true,
        env = "RELIC_CONFIG",
        value_name = "FILE",
        long_help = "JSON file adding or replacing resource families, flag\n\
annotations, cross-links, TTL overrides, cacheability rules and resolver\n\
strategies. Builtin entries stay available unless replaced by key."
    )]
    pub config: Option<PathBuf>,

    /// Quiet mode (minimal stderr output).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug-level diagnostics on stderr. The RELIC_LOG\n\
environment variable overrides this with a full filter expression."
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print completion candidates for one resource collection.
    #[command(
        long_about = "Print completion candidates for COLLECTION, one per line.\n\n\
Candidates come from the cache when a fresh record exists; otherwise the\n\
family's list command runs under the watchdog and the cache is repopulated.\n\
Names found under an unresolved hierarchy level carry flag annotations,\n\
e.g. `web-1 --zone us-east1-b`.\n\n\
Examples:\n\
  relic complete compute.instances --param project=my-proj\n\
  relic complete compute.instances --param project=my-proj --param zone=us-east1-b --prefix web\n"
    )]
    Complete {
        /// Collection to complete, e.g. compute.instances.
        collection: String,

        /// Fix one hierarchy parameter (repeatable).
        #[arg(
            long,
            value_name = "KEY=VALUE",
            long_help = "Fix one optional hierarchy parameter, e.g.\n\
--param project=my-proj --param zone=us-east1-b.\n\n\
Parameters left unset stay unresolved and are expanded from the cache\n\
across all known values of that level."
        )]
        param: Vec<String>,

        /// Word prefix to filter candidates.
        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,

        /// Completion line; the word after the last whitespace becomes the prefix.
        #[arg(
            long,
            value_name = "LINE",
            env = "COMP_LINE",
            long_help = "Full command line being completed (the shell exports\n\
COMP_LINE). The trailing word is used as the prefix; --prefix wins when\n\
both are given."
        )]
        line: Option<String>,

        /// Live-fetch timeout in seconds.
        #[arg(long, value_name = "SECS", default_value_t = 3.0)]
        timeout: f64,

        /// Disable the progress ticker (and with it timeout enforcement).
        #[arg(long)]
        no_tick: bool,
    },

    /// Inspect or mutate the completion cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// List configured resource collections.
    Families,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Add one identity to its cache record (created if absent).
    #[command(
        long_about = "Add one resource identity to its cache record, creating the\n\
record with a fresh TTL when none exists. An existing record keeps its\n\
expiry. Identities of non-cacheable collections are ignored.\n\n\
Meant to be called after creating a resource, so completions stay current\n\
without another remote list."
    )]
    Add {
        /// Resource identity (self-link).
        identity: String,
    },

    /// Remove one identity from its cache record.
    #[command(
        long_about = "Remove one resource identity from its cache record; removing\n\
the last name deletes the record entirely. Missing records or names are\n\
ignored."
    )]
    Remove {
        /// Resource identity (self-link).
        identity: String,
    },

    /// Delete the entire cache tree.
    Clear,

    /// Show every cache record with its name count and expiry.
    Status,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let registry = match &cli.config {
        Some(path) => Registry::from_file(path)?,
        None => Registry::builtin(),
    };
    let root = completion_cache_dir(cli.cache_dir.as_deref());
    let cache = CompletionCache::new(root, &registry);

    match cli.command {
        Commands::Complete {
            collection,
            param,
            prefix,
            line,
            timeout,
            no_tick,
        } => {
            let params = parse_params(&param)?;
            crate::flows::complete::run_complete(
                &registry,
                &cache,
                &collection,
                &params,
                prefix.as_deref(),
                line.as_deref(),
                Duration::from_secs_f64(timeout.max(0.0)),
                no_tick,
            )
        }

        Commands::Cache { action } => match action {
            CacheCommands::Add { identity } => {
                crate::cache::store::run_mutate(&registry, &cache, &identity, false, cli.quiet)
            }
            CacheCommands::Remove { identity } => {
                crate::cache::store::run_mutate(&registry, &cache, &identity, true, cli.quiet)
            }
            CacheCommands::Clear => cache.clear(),
            CacheCommands::Status => crate::backends::status::run_status(&cache),
        },

        Commands::Families => crate::backends::status::run_families(&registry),
    }
}

/// Parse repeated `--param KEY=VALUE` values.
fn parse_params(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("--param expects KEY=VALUE, got '{entry}'"))?;
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}
