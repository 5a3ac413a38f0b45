//! # Scanner Module
//!
//! Turns the paths given on the command line into candidate files.
//!
//! No format filtering happens by default: every file under a directory is
//! a candidate, and those that fail to decode are skipped when hashed.
//!
//! ## Example
//! ```rust,ignore
//! use imagesearch::core::scanner::{ImageEnumerator, ScanConfig};
//!
//! let enumerator = ImageEnumerator::new(ScanConfig::default());
//! for candidate in enumerator.enumerate(&["/Users/photos".into()]) {
//!     println!("{}", candidate?.path.display());
//! }
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{Enumeration, ImageEnumerator, ScanConfig};

use std::path::{Path, PathBuf};

/// A file to fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path as enumerated
    pub path: PathBuf,
    /// Named directly on the command line rather than found in a directory
    pub explicit: bool,
}

/// Identity of a path for de-duplication: `a.png`, `./a.png` and the
/// absolute spelling share one key. Symlinks are not resolved.
pub fn path_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.components().collect())
}
