//! # Reporter Module
//!
//! Renders search and dupe results for stdout.
//!
//! ## Formats
//! - **text**: `<distance>\t<path>` per search match; for dupes, the
//!   fingerprint in hex followed by indented member paths
//! - **json**: `[{"path", "distance"}]` for search,
//!   `[{"fingerprint", "paths"}]` for dupes, pretty-printed
//!
//! Nothing but results is written here; diagnostics go through `tracing`
//! to stderr.

mod json;
mod text;

pub use json::EncodedPath;

use crate::core::dupe::DuplicateGroup;
use crate::core::search::SearchMatch;
use crate::error::ReportError;
use std::io::Write;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    #[default]
    Json,
}

impl OutputFormat {
    /// Every format, in listing order
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Text, OutputFormat::Json];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == normalized)
            .ok_or_else(|| format!("no format named '{}' (choose from: text, json)", s))
    }
}

/// Write search results in `format`
pub fn write_search<W: Write>(
    matches: &[SearchMatch],
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), ReportError> {
    match format {
        OutputFormat::Text => text::write_search(matches, writer),
        OutputFormat::Json => json::write_search(matches, writer),
    }
}

/// Write duplicate groups in `format`
pub fn write_dupes<W: Write>(
    groups: &[DuplicateGroup],
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), ReportError> {
    match format {
        OutputFormat::Text => text::write_dupes(groups, writer),
        OutputFormat::Json => json::write_dupes(groups, writer),
    }
}
