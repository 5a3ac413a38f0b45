//! # Error Module
//!
//! Error types for image search and duplicate detection.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, parameter names, what went wrong
//! - **Per-candidate errors are recoverable** - only reference image and
//!   configuration errors abort a run

use crate::core::hasher::Algorithm;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ImageSearchError {
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Invalid algorithm parameters: {0}")]
    Param(#[from] ParamError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Output error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while enumerating search paths
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path not found or not a file or directory: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// The path this error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanError::NotFound { path }
            | ScanError::PermissionDenied { path }
            | ScanError::ReadDirectory { path, .. } => path,
        }
    }
}

/// Errors that occur while fingerprinting an image
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Image file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fingerprint computation failed: {0}")]
    Computation(String),

    #[error("Invalid algorithm parameters: {0}")]
    InvalidParameter(#[from] ParamError),
}

impl HashError {
    /// Attach a path to errors raised before the path was known
    /// (decoding from in-memory bytes).
    pub fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            HashError::Decode { path: p, reason } if p.as_os_str().is_empty() => {
                HashError::Decode {
                    path: path.to_path_buf(),
                    reason,
                }
            }
            other => other,
        }
    }
}

/// Errors in the algorithm parameter string or its values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("unknown parameter '{key}' for {algorithm} (accepted: {accepted})")]
    UnknownKey {
        algorithm: Algorithm,
        key: String,
        accepted: String,
    },

    #[error("invalid value '{value}' for parameter '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("malformed parameter '{0}' (expected key=value)")]
    Malformed(String),

    #[error("parameter '{0}' given more than once")]
    Repeated(String),
}

/// Errors raised while comparing fingerprints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error(
        "cannot compare a {left_algorithm} fingerprint of {left_bits} bits \
         with a {right_algorithm} fingerprint of {right_bits} bits"
    )]
    IncompatibleFingerprint {
        left_algorithm: Algorithm,
        left_bits: usize,
        right_algorithm: Algorithm,
        right_bits: usize,
    },
}

/// Errors that occur while rendering results
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write results: {0}")]
    Write(#[from] std::io::Error),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ImageSearchError>;
