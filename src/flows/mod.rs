//! Flows module - operations combining cache, watchdog and collaborators
//!
//! Provides:
//! - complete: the completion orchestration (cache, live fetch, repopulate)
//! - watchdog: progress ticker and hard timeout around the live fetch

pub mod complete;
pub mod watchdog;
