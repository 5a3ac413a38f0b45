//! # Core Module
//!
//! The UI-agnostic search and duplicate-finding engine.
//!
//! ## Modules
//! - `scanner` - Turns paths into candidate files
//! - `hasher` - Computes image fingerprints
//! - `cache` - Remembers fingerprints for one run
//! - `search` - Ranks candidates by distance to a reference
//! - `dupe` - Groups candidates with identical fingerprints
//! - `reporter` - Renders results as text or JSON
//! - `pipeline` - Orchestrates the full workflow

pub mod cache;
pub mod dupe;
pub mod hasher;
pub mod pipeline;
pub mod reporter;
pub mod scanner;
pub mod search;

// Re-export commonly used types
pub use dupe::{group_duplicates, DuplicateGroup};
pub use hasher::{Algorithm, AlgorithmConfig, Fingerprint, FingerprintProvider};
pub use reporter::OutputFormat;
pub use search::{search, SearchMatch, SearchOptions};

use std::path::PathBuf;

/// A fingerprinted image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
}
