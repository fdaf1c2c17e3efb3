//! Resource identities - self-links and their on-disk cache locations
//!
//! A resource identity ("self-link") is a hierarchical string such as
//! `https://www.googleapis.com/compute/v1/projects/p/zones/z/instances/web`.
//! The final segment is the resource's own name; every preceding segment
//! identifies its containment hierarchy. Identities may contain `*`
//! segments for hierarchy levels not yet resolved at completion time.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Sentinel file name that replaces the leaf segment of an identity.
pub const NAMES_FILE: &str = "_names_";

/// Marker for an unresolved hierarchy segment.
pub const WILDCARD: char = '*';

/// Static regex splitting a self-link into host, api and the collection path.
static SELF_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://)?[^/]+/(?P<api>[^/]+)/[^/]+/(?P<rest>.+)$")
        .expect("Invalid SELF_LINK_RE regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("self-link is not a parseable resource reference: {0}")]
    Malformed(String),
}

/// Cache location of one identity: record file path relative to the cache
/// root, plus the identity's own leaf name.
///
/// Two identities differing only in leaf name map to the same file;
/// identical identities always map to the same location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePath {
    pub file: String,
    pub name: String,
}

/// Structured reference extracted from a self-link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Service prefix, e.g. `compute`.
    pub api: String,
    /// Collection name, e.g. `compute.instances`.
    pub collection: String,
}

/// Strip a scheme prefix (`https://` etc.) from a self-link.
fn strip_scheme(link: &str) -> &str {
    match link.find("://") {
        Some(idx) => &link[idx + 3..],
        None => link,
    }
}

/// Map an identity to its cache location.
///
/// Pure and total: strips the scheme, splits on `/`, replaces the leaf
/// segment with [`NAMES_FILE`] and keeps the original leaf as the name.
/// This is the single definition shared by the read and write paths.
pub fn to_cache_path(self_link: &str) -> CachePath {
    let stripped = strip_scheme(self_link);
    match stripped.rsplit_once('/') {
        Some((dir, name)) => CachePath {
            file: format!("{dir}/{NAMES_FILE}"),
            name: name.to_string(),
        },
        None => CachePath {
            file: NAMES_FILE.to_string(),
            name: stripped.to_string(),
        },
    }
}

/// Leaf segment of a self-link (the resource's own name).
pub fn leaf_name(self_link: &str) -> &str {
    match self_link.rsplit_once('/') {
        Some((_, name)) => name,
        None => self_link,
    }
}

/// Parse a self-link into a structured reference.
///
/// The collection is the api prefix joined with the identity's last
/// hierarchy level (`.../zones/z/instances/web` -> `compute.instances`).
/// Callers fall back to [`collection_heuristic`] on failure.
pub fn parse_ref(self_link: &str) -> Result<ResourceRef, IdentityError> {
    let malformed = || IdentityError::Malformed(self_link.to_string());
    let caps = SELF_LINK_RE.captures(self_link).ok_or_else(malformed)?;
    let api = &caps["api"];
    let rest = &caps["rest"];
    let segments: Vec<&str> = rest.split('/').collect();
    if segments.len() < 2 {
        return Err(malformed());
    }
    let level = segments[segments.len() - 2];
    if api.contains(WILDCARD) || level.contains(WILDCARD) || level.is_empty() {
        return Err(malformed());
    }
    Ok(ResourceRef {
        api: api.to_string(),
        collection: format!("{api}.{level}"),
    })
}

/// Positional fallback when reference parsing fails: the collection is
/// assembled from fixed offsets in the raw link (segment 3 is the api,
/// the second-to-last segment is the hierarchy level).
pub fn collection_heuristic(self_link: &str) -> Option<String> {
    let parts: Vec<&str> = self_link.split('/').collect();
    if parts.len() < 6 {
        return None;
    }
    let api = parts[3];
    let level = parts[parts.len() - 2];
    if api.is_empty() || level.is_empty() {
        return None;
    }
    Some(format!("{api}.{level}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str =
        "https://www.googleapis.com/compute/v1/projects/my-proj/zones/us-east1-b/instances/web-1";

    #[test]
    fn test_to_cache_path() {
        let path = to_cache_path(LINK);
        assert_eq!(
            path.file,
            "www.googleapis.com/compute/v1/projects/my-proj/zones/us-east1-b/instances/_names_"
        );
        assert_eq!(path.name, "web-1");
    }

    #[test]
    fn test_to_cache_path_is_stable() {
        assert_eq!(to_cache_path(LINK), to_cache_path(LINK));
    }

    #[test]
    fn test_siblings_share_a_record_file() {
        let a = to_cache_path("https://h/api/v1/projects/p/widgets/a");
        let b = to_cache_path("https://h/api/v1/projects/p/widgets/b");
        assert_eq!(a.file, b.file);
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn test_to_cache_path_without_scheme() {
        let path = to_cache_path("host/api/v1/projects/p/widgets/w");
        assert_eq!(path.file, "host/api/v1/projects/p/widgets/_names_");
        assert_eq!(path.name, "w");
    }

    #[test]
    fn test_to_cache_path_single_segment() {
        let path = to_cache_path("lonely");
        assert_eq!(path.file, NAMES_FILE);
        assert_eq!(path.name, "lonely");
    }

    #[test]
    fn test_parse_ref() {
        let parsed = parse_ref(LINK).unwrap();
        assert_eq!(parsed.api, "compute");
        assert_eq!(parsed.collection, "compute.instances");
    }

    #[test]
    fn test_parse_ref_template_with_wildcard_segment() {
        let template =
            "https://www.googleapis.com/compute/v1/projects/my-proj/zones/*/instances/+";
        let parsed = parse_ref(template).unwrap();
        assert_eq!(parsed.collection, "compute.instances");
    }

    #[test]
    fn test_parse_ref_rejects_wildcard_level() {
        let template = "https://www.googleapis.com/compute/v1/projects/p/*/w";
        assert!(parse_ref(template).is_err());
    }

    #[test]
    fn test_parse_ref_malformed() {
        assert!(parse_ref("not a link").is_err());
        assert!(parse_ref("https://host/only").is_err());
    }

    #[test]
    fn test_collection_heuristic() {
        assert_eq!(
            collection_heuristic(LINK).as_deref(),
            Some("compute.instances")
        );
    }

    #[test]
    fn test_collection_heuristic_too_short() {
        assert_eq!(collection_heuristic("https://host/a/b"), None);
    }

    #[test]
    fn test_leaf_name() {
        assert_eq!(leaf_name(LINK), "web-1");
        assert_eq!(leaf_name("bare"), "bare");
    }
}
