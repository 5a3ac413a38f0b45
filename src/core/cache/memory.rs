//! In-memory fingerprint cache.

use super::CacheStats;
use crate::core::hasher::Fingerprint;
use crate::core::scanner::path_key;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Per-run map from path to fingerprint.
///
/// Keys are normalized with [`path_key`], so `a.png` and `./a.png` share
/// one entry.
///
/// Shared by reference across rayon workers. A poisoned lock is recovered
/// rather than propagated; entries are never left half-written.
pub struct FingerprintCache {
    entries: RwLock<HashMap<PathBuf, Fingerprint>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl FingerprintCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, Fingerprint>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, Fingerprint>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a fingerprint, counting the hit or miss
    pub fn get(&self, path: &Path) -> Option<Fingerprint> {
        let found = self.read().get(&path_key(path)).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a fingerprint. An existing entry for the path is kept.
    pub fn insert(&self, path: PathBuf, fingerprint: Fingerprint) {
        self.write().entry(path_key(&path)).or_insert(fingerprint);
    }

    /// Return the cached fingerprint for `path`, computing and storing it
    /// on a miss. Failures are not cached.
    ///
    /// The computation runs without holding the lock, so two threads racing
    /// on the same path may both compute; the first stored value wins.
    pub fn get_or_try_insert_with<F, E>(&self, path: &Path, compute: F) -> Result<Fingerprint, E>
    where
        F: FnOnce() -> Result<Fingerprint, E>,
    {
        if let Some(fingerprint) = self.get(path) {
            return Ok(fingerprint);
        }

        let fingerprint = compute()?;
        let mut entries = self.write();
        Ok(entries
            .entry(path_key(path))
            .or_insert(fingerprint)
            .clone())
    }

    /// Number of cached fingerprints
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new()
    }
}
