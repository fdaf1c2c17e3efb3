//! Cache inspection - record status and family listing

use anyhow::Result;
use chrono::{DateTime, Local};
use colored::Colorize;
use std::fs;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::cache::expiry::ExpiryPolicy;
use crate::cache::CompletionCache;
use crate::core::identity::NAMES_FILE;
use crate::core::registry::Registry;
use crate::core::util::{expiry_of, now};

/// Snapshot of one on-disk cache record.
#[derive(Debug, Clone)]
pub struct RecordStatus {
    /// Record path relative to the cache root.
    pub path: String,
    /// Number of cached names.
    pub names: usize,
    pub expires_at: SystemTime,
    pub fresh: bool,
}

/// Walk the cache tree and collect every record, in path order.
pub fn collect_status(cache: &CompletionCache) -> Result<Vec<RecordStatus>> {
    let mut records = Vec::new();
    if !cache.root().exists() {
        return Ok(records);
    }

    for entry in WalkDir::new(cache.root()).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name().to_str() != Some(NAMES_FILE) {
            continue;
        }
        let names = fs::read_to_string(entry.path())?.lines().count();
        let expires_at = expiry_of(entry.path())?;
        let path = entry
            .path()
            .strip_prefix(cache.root())
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        records.push(RecordStatus {
            path,
            names,
            expires_at,
            fresh: expires_at > now(),
        });
    }
    Ok(records)
}

/// CLI entry for `relic cache status`.
pub fn run_status(cache: &CompletionCache) -> Result<()> {
    let records = collect_status(cache)?;
    if records.is_empty() {
        println!("cache is empty");
        return Ok(());
    }

    for record in records {
        let state = if record.fresh {
            "fresh".green()
        } else {
            "expired".red()
        };
        let expires: DateTime<Local> = record.expires_at.into();
        println!(
            "{:7} {:>4} {}  (expires {})",
            state,
            record.names,
            record.path,
            expires.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

/// CLI entry for `relic families`.
pub fn run_families(registry: &Registry) -> Result<()> {
    let policy = ExpiryPolicy::for_registry(registry);
    let mut families: Vec<_> = registry.families().collect();
    families.sort_by(|a, b| a.collection.cmp(&b.collection));

    for family in families {
        println!(
            "{}  ttl={}s  params={}",
            family.collection,
            policy.lookup(&family.collection).as_secs(),
            family.params.join(",")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::util::set_expiry;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    fn test_cache(root: &Path) -> CompletionCache {
        CompletionCache::new(root.to_path_buf(), &Registry::builtin())
    }

    #[test]
    fn test_collect_status_empty_root() {
        let temp = tempdir().unwrap();
        let cache = test_cache(&temp.path().join("missing"));
        assert!(collect_status(&cache).unwrap().is_empty());
    }

    #[test]
    fn test_collect_status_reports_records() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[
            "https://www.googleapis.com/compute/v1/projects/p/zones/z1/instances/a".to_string(),
            "https://www.googleapis.com/compute/v1/projects/p/zones/z1/instances/b".to_string(),
            "https://www.googleapis.com/compute/v1/projects/p/zones/z2/instances/c".to_string(),
        ]);

        let stale = temp
            .path()
            .join("www.googleapis.com/compute/v1/projects/p/zones/z2/instances/_names_");
        set_expiry(&stale, now() - Duration::from_secs(1)).unwrap();

        let records = collect_status(&cache).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].names, 2);
        assert!(records[0].fresh);
        assert_eq!(records[1].names, 1);
        assert!(!records[1].fresh);
    }
}
