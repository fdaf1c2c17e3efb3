//! Core module - identities, registry and shared utilities
//!
//! This module provides:
//! - Resource identity handling (self-links, cache path derivation)
//! - The family registry (templates, flags, cross-links, TTLs, resolvers)
//! - Cache directory resolution
//! - Expiry time utilities

pub mod identity;
pub mod paths;
pub mod registry;
pub mod util;
