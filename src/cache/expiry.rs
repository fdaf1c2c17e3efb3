//! Per-collection TTL policy

use std::collections::HashMap;
use std::time::Duration;

use crate::core::registry::Registry;

/// TTL applied to collections without an explicit entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Maps a collection name to the TTL of its cache records. Immutable after
/// construction.
#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    ttls: HashMap<String, Duration>,
    default_ttl: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ExpiryPolicy {
    /// Builtin table: long-lived topology collections (regions, zones) keep
    /// for ten hours, instance-like collections for ten minutes.
    pub fn builtin() -> Self {
        let ttls = [
            ("sql.instances", 600),
            ("compute.instances", 600),
            ("compute.regions", 3600 * 10),
            ("compute.zones", 3600 * 10),
        ]
        .into_iter()
        .map(|(collection, secs)| (collection.to_string(), Duration::from_secs(secs)))
        .collect();

        Self {
            ttls,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Builtin table with a registry's TTL overrides applied.
    pub fn for_registry(registry: &Registry) -> Self {
        let mut policy = Self::builtin();
        let (overrides, default_secs) = registry.ttl_overrides();
        for (collection, secs) in overrides {
            policy
                .ttls
                .insert(collection.clone(), Duration::from_secs(*secs));
        }
        if let Some(secs) = default_secs {
            policy.default_ttl = Duration::from_secs(secs);
        }
        policy
    }

    pub fn lookup(&self, collection: &str) -> Duration {
        self.ttls
            .get(collection)
            .copied()
            .unwrap_or(self.default_ttl)
    }
}
