//! Cache write path - population and incremental mutation
//!
//! Writes are best-effort: the cache is an accelerator, so I/O failures
//! leave it unpopulated (or partially populated) and are never surfaced to
//! the caller.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::time::SystemTime;

use crate::cache::CompletionCache;
use crate::core::identity::{collection_heuristic, parse_ref, to_cache_path, WILDCARD};
use crate::core::registry::Registry;
use crate::core::util::{expiry_of, now, set_expiry};

impl CompletionCache {
    /// Store the identities of freshly-listed resources.
    ///
    /// Identities are grouped per record file; the owning collection is
    /// taken from the first identity (positional heuristic when parsing
    /// fails) and selects the TTL. Files that already exist keep both
    /// their contents and their expiry (store-once; use [`add`](Self::add)
    /// / [`remove`](Self::remove) for incremental changes).
    pub fn store_all(&self, self_links: &[String]) {
        if let Err(err) = self.try_store_all(self_links) {
            tracing::debug!("cache population stopped: {err:#}");
        }
    }

    fn try_store_all(&self, self_links: &[String]) -> io::Result<()> {
        let mut collection: Option<String> = None;
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for link in self_links {
            if collection.is_none() {
                collection = match parse_ref(link) {
                    Ok(parsed) => Some(parsed.collection),
                    Err(_) => collection_heuristic(link),
                };
            }
            let path = to_cache_path(link);
            // Identities with unresolved segments cannot round-trip.
            if path.file.contains(WILDCARD) {
                continue;
            }
            let names = groups.entry(path.file).or_default();
            if !names.contains(&path.name) {
                names.push(path.name);
            }
        }
        let Some(collection) = collection else {
            return Ok(());
        };

        let ttl = self.policy.lookup(&collection);
        for (file, names) in groups {
            let abs = self.root.join(&file);
            if abs.exists() {
                continue;
            }
            if let Some(parent) = abs.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&abs, names.join("\n"))?;
            set_expiry(&abs, now() + ttl)?;
        }
        Ok(())
    }

    /// Add one identity to its cache record. Creates a fresh record when
    /// none exists; otherwise the record's expiry is left untouched.
    pub fn add(&self, self_link: &str) {
        if let Err(err) = self.mutate(self_link, false) {
            tracing::debug!("cache add skipped: {err}");
        }
    }

    /// Remove one identity from its cache record. Removing the last name
    /// deletes the record; a missing record or name is a no-op.
    pub fn remove(&self, self_link: &str) {
        if let Err(err) = self.mutate(self_link, true) {
            tracing::debug!("cache remove skipped: {err}");
        }
    }

    fn mutate(&self, self_link: &str, remove: bool) -> io::Result<()> {
        let path = to_cache_path(self_link);
        let abs = self.root.join(&path.file);

        let record: io::Result<(SystemTime, String)> =
            expiry_of(&abs).and_then(|expiry| Ok((expiry, fs::read_to_string(&abs)?)));
        let (expiry, data) = match record {
            Ok(record) => record,
            Err(_) => {
                if !remove {
                    self.store_all(std::slice::from_ref(&self_link.to_string()));
                }
                return Ok(());
            }
        };

        let mut names: Vec<String> = data.lines().map(str::to_string).collect();
        if remove {
            let Some(pos) = names.iter().position(|name| name == &path.name) else {
                return Ok(());
            };
            names.remove(pos);
            if names.is_empty() {
                return fs::remove_file(&abs);
            }
        } else {
            if names.iter().any(|name| name == &path.name) {
                return Ok(());
            }
            names.push(path.name.clone());
        }

        fs::write(&abs, names.join("\n"))?;
        // Mutation never extends the record's TTL.
        set_expiry(&abs, expiry)
    }

    /// Delete the whole cache tree.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).context("Failed to remove cache directory")?;
        }
        Ok(())
    }
}

/// CLI entry for `relic cache add` / `relic cache remove`. Identities of
/// collections outside the cacheable set are ignored.
pub fn run_mutate(
    registry: &Registry,
    cache: &CompletionCache,
    identity: &str,
    remove: bool,
    quiet: bool,
) -> Result<()> {
    let collection = parse_ref(identity)
        .map(|parsed| parsed.collection)
        .ok()
        .or_else(|| collection_heuristic(identity));
    let cacheable = collection
        .as_deref()
        .map(|collection| registry.is_cached(collection))
        .unwrap_or(false);
    if !cacheable {
        if !quiet {
            eprintln!("not a cached collection: {identity}");
        }
        return Ok(());
    }
    if remove {
        cache.remove(identity);
    } else {
        cache.add(identity);
    }
    Ok(())
}
