//! Completion cache - hierarchical, file-backed, TTL-expiring
//!
//! One directory level per hierarchy segment of a resource identity; each
//! leaf-level `_names_` file holds the newline-separated names of sibling
//! resources. A record's expiry instant is encoded in the file's
//! modification time (see `core::util`). Best-effort and uncoordinated:
//! there is no cross-process locking and no eviction beyond TTL expiry.

pub mod expiry;
pub mod reader;
pub mod stats;
pub mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cache::expiry::ExpiryPolicy;
use crate::cache::stats::CompletionStats;
use crate::core::registry::{CrossLink, Registry};

/// File-backed cache of remote resource names.
///
/// Read operations live in `reader`, write operations in `store`.
pub struct CompletionCache {
    root: PathBuf,
    policy: ExpiryPolicy,
    flags: HashMap<String, String>,
    cross_links: Vec<CrossLink>,
    stats: CompletionStats,
}

impl CompletionCache {
    pub fn new(root: PathBuf, registry: &Registry) -> Self {
        Self {
            root,
            policy: ExpiryPolicy::for_registry(registry),
            flags: registry.flags().clone(),
            cross_links: registry.cross_links().to_vec(),
            stats: CompletionStats::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> &CompletionStats {
        &self.stats
    }
}
