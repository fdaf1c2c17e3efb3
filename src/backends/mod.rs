//! Backends module - external collaborators and cache inspection
//!
//! Provides:
//! - lister: runs a family's list command and parses its output items
//! - resolver: per-family normalization of items to resource identities
//! - status: cache tree inspection and family listing

pub mod lister;
pub mod resolver;
pub mod status;
