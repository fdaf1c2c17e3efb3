//! Completion flow - cache lookup with a guarded live-fetch fallback
//!
//! The orchestration behind one completion request: build an identity
//! template from the partially-known parameters, consult the cache, fall
//! back to the family's list command under the watchdog, normalize the
//! items to identities, repopulate the cache and answer from it. Failures
//! degrade to an empty candidate list; a completion must never crash the
//! invoking shell.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

use crate::backends::lister::{CommandLister, Lister};
use crate::backends::resolver::ResolverRegistry;
use crate::cache::CompletionCache;
use crate::core::identity::{leaf_name, WILDCARD};
use crate::core::registry::Registry;
use crate::flows::watchdog::{ticker_stream, Watchdog, DEFAULT_TIMEOUT};

/// Orchestrates completion requests against one cache and one lister.
pub struct Completer<'a> {
    registry: &'a Registry,
    cache: &'a CompletionCache,
    lister: &'a dyn Lister,
    resolvers: ResolverRegistry,
    timeout: Duration,
    autotick: bool,
}

impl<'a> Completer<'a> {
    pub fn new(registry: &'a Registry, cache: &'a CompletionCache, lister: &'a dyn Lister) -> Self {
        Self {
            registry,
            cache,
            lister,
            resolvers: ResolverRegistry::for_registry(registry),
            timeout: DEFAULT_TIMEOUT,
            autotick: true,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn autotick(mut self, autotick: bool) -> Self {
        self.autotick = autotick;
        self
    }

    /// Replace the resolver registry, e.g. to plug in a custom callback.
    #[allow(dead_code)]
    pub fn resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Produce completion candidates for one collection.
    pub fn complete(
        &self,
        collection: &str,
        params: &HashMap<String, String>,
        prefix: &str,
    ) -> Vec<String> {
        match self.try_complete(collection, params, prefix) {
            Ok(options) => options,
            Err(err) => {
                tracing::error!("completion for {collection} failed: {err:#}");
                Vec::new()
            }
        }
    }

    fn try_complete(
        &self,
        collection: &str,
        params: &HashMap<String, String>,
        prefix: &str,
    ) -> Result<Vec<String>> {
        let family = self
            .registry
            .family(collection)
            .ok_or_else(|| anyhow!("unknown collection '{collection}'"))?;
        let template = family.build_template(params);

        if let Some(options) = self.cache.read(&template, prefix) {
            return Ok(options);
        }

        // Cache miss: go to the remote list command, bounded by the
        // watchdog. The lister may block indefinitely otherwise.
        let unresolved = template.contains(WILDCARD);
        let items = {
            let watchdog = Watchdog::new(ticker_stream(), self.timeout, self.autotick);
            let items = self.lister.list(family, params);
            watchdog.finish();
            items?
        };

        let mut options = Vec::new();
        let mut identities = Vec::new();
        for item in &items {
            let identity = self.resolvers.resolve(family.api(), item, &template)?;
            let name = leaf_name(&identity);
            if prefix.is_empty() || name.starts_with(prefix) {
                options.push(name.to_string());
            }
            identities.push(identity);
        }
        if identities.is_empty() {
            return Ok(options);
        }

        self.cache.store_all(&identities);
        if unresolved {
            // Answer through the cache so wildcard branches get their flag
            // annotations, then take back the hit this re-read generated:
            // the data did not come from a pre-existing fresh record.
            return match self.cache.read(&template, prefix) {
                Some(options) => {
                    self.cache.stats().uncount_hit();
                    Ok(options)
                }
                None => Ok(Vec::new()),
            };
        }
        Ok(options)
    }
}

/// CLI entry for `relic complete`.
#[allow(clippy::too_many_arguments)]
pub fn run_complete(
    registry: &Registry,
    cache: &CompletionCache,
    collection: &str,
    params: &HashMap<String, String>,
    prefix: Option<&str>,
    line: Option<&str>,
    timeout: Duration,
    no_tick: bool,
) -> Result<()> {
    let prefix = match (prefix, line) {
        (Some(prefix), _) => prefix.to_string(),
        (None, Some(line)) => last_word(line),
        (None, None) => String::new(),
    };

    let lister = CommandLister;
    let completer = Completer::new(registry, cache, &lister)
        .timeout(timeout)
        .autotick(!no_tick);
    let options = completer.complete(collection, params, &prefix);

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    for option in &options {
        writeln!(stdout, "{option}")?;
    }
    tracing::debug!(
        tries = cache.stats().tries(),
        hits = cache.stats().hits(),
        "cache counters"
    );
    Ok(())
}

/// The word being completed: the suffix of the line after the last
/// whitespace.
fn last_word(line: &str) -> String {
    line.rsplit([' ', '\t'])
        .next()
        .unwrap_or_default()
        .to_string()
}
