//! # Cache Module
//!
//! Remembers fingerprints for the duration of one run so that no image is
//! decoded twice, even when it is reachable through several of the given
//! paths. Nothing is persisted.

mod memory;

pub use memory::FingerprintCache;

use serde::Serialize;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cached fingerprints
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that had to compute
    pub misses: usize,
}
