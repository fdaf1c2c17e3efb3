//! Cache effectiveness counters

use std::sync::atomic::{AtomicI64, Ordering};

/// Lookup counters scoped to one [`CompletionCache`](super::CompletionCache).
///
/// `tries` counts top-level read calls, `hits` counts fresh record files
/// actually parsed within those calls. After a live fetch the completion
/// flow re-reads the cache it just populated and compensates the artificial
/// hit with [`uncount_hit`](Self::uncount_hit).
#[derive(Debug, Default)]
pub struct CompletionStats {
    tries: AtomicI64,
    hits: AtomicI64,
}

impl CompletionStats {
    pub fn record_try(&self) {
        self.tries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uncount_hit(&self) {
        self.hits.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn tries(&self) -> i64 {
        self.tries.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> i64 {
        self.hits.load(Ordering::Relaxed)
    }
}
