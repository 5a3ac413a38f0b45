//! # Pipeline Module
//!
//! Orchestrates a search or dupe run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Enumerate candidate files under the given paths
//! 2. **Hash** - Fingerprint every candidate (cached per run)
//! 3. **Search / Group** - Rank against a reference, or group duplicates
//!
//! ## Parallelism
//! Uses rayon for parallel hashing across multiple CPU cores. Results are
//! collected back into enumeration order before searching or grouping.

mod executor;

pub use executor::{
    DupeResult, Fingerprinted, Pipeline, PipelineBuilder, PipelineConfig, SearchResult,
    SkippedPath,
};
