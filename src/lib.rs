//! # imagesearch
//!
//! Find visually similar and duplicate images with perceptual fingerprints.
//!
//! ## What It Does
//! - **search** - rank images by fingerprint distance to a reference image
//! - **dupe** - group images whose fingerprints are identical
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation:
//! - `core` - Enumeration, fingerprinting, search and grouping
//! - `events` - Progress reporting over channels
//! - `error` - Error types
//!
//! The `imagesearch` binary adds the command-line interface on top.

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ImageSearchError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library, writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `verbosity` selects the level
/// (0 = warn, 1 = debug, 2+ = trace). Calling this twice is harmless.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
