//! # Search Module
//!
//! Ranks candidate images by their distance to a reference image.
//!
//! ## How It Works
//! 1. Compute the Hamming distance from the reference to each candidate
//! 2. Drop candidates farther than the threshold, if one is set
//! 3. Either stop at the first qualifying candidate or sort everything
//!    ascending by distance (ties keep enumeration order)
//!
//! Distances are small integers, so a distance of 0 means the two
//! fingerprints are identical, not that the files are.

use super::ImageRecord;
use crate::core::hasher::Fingerprint;
use crate::error::CompareError;

/// Options for a search run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum distance to report (None = report everything)
    pub threshold: Option<u32>,
    /// Report only the first qualifying candidate, in enumeration order.
    ///
    /// Without a threshold a candidate qualifies only at distance 0.
    pub stop_on_first_match: bool,
}

impl SearchOptions {
    /// Whether a candidate at `distance` passes the threshold test
    pub fn accepts(&self, distance: u32) -> bool {
        self.threshold.map_or(true, |t| distance <= t)
    }

    /// Whether a candidate at `distance` ends a first-match search
    fn is_first_match(&self, distance: u32) -> bool {
        match self.threshold {
            Some(t) => distance <= t,
            None => distance == 0,
        }
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub record: ImageRecord,
    pub distance: u32,
}

/// Compare every candidate against `reference`.
///
/// Candidates must be in enumeration order; that order decides both the
/// first match and the order among equal distances. Any fingerprint of a
/// different kind than the reference is an error.
pub fn search<I>(
    reference: &Fingerprint,
    candidates: I,
    options: &SearchOptions,
) -> Result<Vec<SearchMatch>, CompareError>
where
    I: IntoIterator<Item = ImageRecord>,
{
    let mut matches = Vec::new();

    for record in candidates {
        let distance = reference.distance(&record.fingerprint)?;

        if options.stop_on_first_match {
            if options.is_first_match(distance) {
                tracing::debug!(path = %record.path.display(), distance, "first match");
                return Ok(vec![SearchMatch { record, distance }]);
            }
            continue;
        }

        if options.accepts(distance) {
            matches.push(SearchMatch { record, distance });
        }
    }

    matches.sort_by_key(|m| m.distance);
    Ok(matches)
}
