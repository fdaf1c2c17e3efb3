//! Cache read path - freshness checks and wildcard resolution
//!
//! Absent (`None`) is distinct from empty (`Some(vec![])`): absent means no
//! fresh data was found anywhere along the path and the caller must fall
//! back to a live fetch; an empty result means at least one fresh record
//! was found but nothing matched the prefix.

use std::fs;
use std::path::Path;

use crate::cache::CompletionCache;
use crate::core::identity::{to_cache_path, WILDCARD};
use crate::core::util::is_fresh;

impl CompletionCache {
    /// Look up completion candidates for `self_link`, filtered by `prefix`.
    ///
    /// Wildcard segments in the identity are expanded by enumerating cached
    /// sub-directories; every name produced from a wildcard branch carries
    /// the flag annotations accumulated along the descent (for example
    /// ` --zone us-east1-b`).
    pub fn read(&self, self_link: &str, prefix: &str) -> Option<Vec<String>> {
        self.stats.record_try();
        let path = to_cache_path(self_link);
        let fpath = self.root.join(&path.file);
        self.read_matches(&fpath.to_string_lossy(), prefix, "")
    }

    fn read_matches(&self, fpath: &str, prefix: &str, flags: &str) -> Option<Vec<String>> {
        if let Some((head, rest)) = fpath.split_once(WILDCARD) {
            return self.read_branches(head, rest, prefix, flags);
        }

        let path = Path::new(fpath);
        if !is_fresh(path) {
            return None;
        }
        let data = fs::read_to_string(path).ok()?;
        let mut options = Vec::new();
        for name in data.lines() {
            if prefix.is_empty() || name.starts_with(prefix) {
                options.push(format!("{name}{flags}"));
            }
        }
        self.stats.record_hit();
        Some(options)
    }

    /// Expand one wildcard level: enumerate the literal head directory and
    /// recurse into each branch, merging the non-absent results.
    fn read_branches(
        &self,
        head: &str,
        rest: &str,
        prefix: &str,
        flags: &str,
    ) -> Option<Vec<String>> {
        let head_dir = Path::new(head);
        if !head_dir.is_dir() {
            return None;
        }

        let level = level_name(head);
        let level_flag = self.level_flag(head, level);

        let mut entries: Vec<String> = fs::read_dir(head_dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.contains(WILDCARD))
            .collect();
        entries.sort();

        let mut merged: Option<Vec<String>> = None;
        for name in entries {
            let child = format!("{head}{name}{rest}");
            let branch_flags = match level_flag {
                Some(flag) => format!("{flags} --{flag} {name}"),
                None => flags.to_string(),
            };
            if let Some(found) = self.read_matches(&child, prefix, &branch_flags) {
                merged.get_or_insert_with(Vec::new).extend(found);
            }
        }

        // Resource families may cross-link a sibling branch at the same
        // depth, e.g. regional collections also exist under global/.
        for link in &self.cross_links {
            if level != link.level {
                continue;
            }
            let parent = &head[..head.len() - (link.level.len() + 1)];
            let sibling = format!("{parent}{}{rest}", link.sibling);
            let sibling_flags = format!("{flags} {}", link.flag);
            if let Some(found) = self.read_matches(&sibling, prefix, &sibling_flags) {
                merged.get_or_insert_with(Vec::new).extend(found);
            }
        }

        merged
    }

    /// Flag name for names enumerated under `head`, looked up from the
    /// registry table by `api.level` (e.g. `compute.zones` -> `zone`).
    fn level_flag<'a>(&'a self, head: &str, level: &str) -> Option<&'a str> {
        let rel = Path::new(head).strip_prefix(&self.root).ok()?;
        let api = rel.components().nth(1)?;
        let api = api.as_os_str().to_str()?;
        self.flags.get(&format!("{api}.{level}")).map(String::as_str)
    }
}

/// Last directory name of a head path ending in `/`.
fn level_name(head: &str) -> &str {
    head.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Registry;
    use crate::core::util::{now, set_expiry};
    use std::time::Duration;
    use tempfile::tempdir;

    fn test_cache(root: &Path) -> CompletionCache {
        CompletionCache::new(root.to_path_buf(), &Registry::builtin())
    }

    fn instance_link(zone: &str, name: &str) -> String {
        format!(
            "https://www.googleapis.com/compute/v1/projects/p/zones/{zone}/instances/{name}"
        )
    }

    const INSTANCE_TEMPLATE: &str =
        "https://www.googleapis.com/compute/v1/projects/p/zones/*/instances/+";

    #[test]
    fn test_read_empty_cache_is_absent() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());

        assert_eq!(cache.read(&instance_link("us-east1-b", "web"), ""), None);
        assert_eq!(cache.stats().tries(), 1);
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_read_fresh_record() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[
            instance_link("us-east1-b", "web-1"),
            instance_link("us-east1-b", "db-1"),
        ]);

        let options = cache.read(&instance_link("us-east1-b", "web-1"), "").unwrap();
        assert_eq!(options, vec!["web-1", "db-1"]);
        assert_eq!(cache.stats().tries(), 1);
        assert_eq!(cache.stats().hits(), 1);
    }

    #[test]
    fn test_prefix_miss_is_empty_not_absent() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[instance_link("us-east1-b", "web-1")]);

        let options = cache.read(&instance_link("us-east1-b", "x"), "zzz");
        assert_eq!(options, Some(vec![]));
        assert_eq!(cache.stats().hits(), 1);
    }

    #[test]
    fn test_expired_record_is_absent() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        let link = instance_link("us-east1-b", "web-1");
        cache.store_all(&[link.clone()]);

        let record = temp
            .path()
            .join("www.googleapis.com/compute/v1/projects/p/zones/us-east1-b/instances/_names_");
        set_expiry(&record, now() - Duration::from_secs(1)).unwrap();

        assert_eq!(cache.read(&link, ""), None);
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_wildcard_union_skips_stale_branch() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[
            instance_link("us-east1-b", "web-1"),
            instance_link("us-west1-a", "web-2"),
            instance_link("eu-north1-c", "web-3"),
        ]);

        let stale = temp
            .path()
            .join("www.googleapis.com/compute/v1/projects/p/zones/eu-north1-c/instances/_names_");
        set_expiry(&stale, now() - Duration::from_secs(1)).unwrap();

        let options = cache.read(INSTANCE_TEMPLATE, "").unwrap();
        assert_eq!(
            options,
            vec![
                "web-1 --zone us-east1-b".to_string(),
                "web-2 --zone us-west1-a".to_string(),
            ]
        );
        // One top-level try, one hit per fresh file parsed.
        assert_eq!(cache.stats().tries(), 1);
        assert_eq!(cache.stats().hits(), 2);
    }

    #[test]
    fn test_wildcard_all_branches_stale_is_absent() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[instance_link("us-east1-b", "web-1")]);

        let record = temp
            .path()
            .join("www.googleapis.com/compute/v1/projects/p/zones/us-east1-b/instances/_names_");
        set_expiry(&record, now() - Duration::from_secs(1)).unwrap();

        assert_eq!(cache.read(INSTANCE_TEMPLATE, ""), None);
    }

    #[test]
    fn test_wildcard_prefix_filter_applies_per_branch() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[
            instance_link("us-east1-b", "web-1"),
            instance_link("us-west1-a", "db-1"),
        ]);

        let options = cache.read(INSTANCE_TEMPLATE, "web").unwrap();
        assert_eq!(options, vec!["web-1 --zone us-east1-b".to_string()]);
    }

    #[test]
    fn test_nested_wildcards_accumulate_flags() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[instance_link("us-east1-b", "web-1")]);

        let template = "https://www.googleapis.com/compute/v1/projects/*/zones/*/instances/+";
        let options = cache.read(template, "").unwrap();
        assert_eq!(
            options,
            vec!["web-1 --project p --zone us-east1-b".to_string()]
        );
    }

    #[test]
    fn test_regions_cross_link_to_global() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        cache.store_all(&[
            "https://www.googleapis.com/compute/v1/projects/p/regions/us-east1/addresses/addr-1"
                .to_string(),
            "https://www.googleapis.com/compute/v1/projects/p/global/addresses/addr-g".to_string(),
        ]);

        let template =
            "https://www.googleapis.com/compute/v1/projects/p/regions/*/addresses/+";
        let options = cache.read(template, "").unwrap();
        assert_eq!(
            options,
            vec![
                "addr-1 --region us-east1".to_string(),
                "addr-g --global".to_string(),
            ]
        );
        assert_eq!(cache.stats().hits(), 2);
    }

    #[test]
    fn test_wildcard_without_parent_directory_is_absent() {
        let temp = tempdir().unwrap();
        let cache = test_cache(temp.path());
        assert_eq!(cache.read(INSTANCE_TEMPLATE, ""), None);
        assert_eq!(cache.stats().tries(), 1);
    }
}
