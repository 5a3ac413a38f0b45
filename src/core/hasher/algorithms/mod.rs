//! Fingerprint algorithm implementations.

mod average;
mod color;
mod difference;
mod perceptual;
mod wavelet;

pub use average::AverageHasher;
pub use color::ColorHasher;
pub use difference::{DifferenceHasher, Direction};
pub use perceptual::{DctAxes, PerceptualHasher};
pub use wavelet::{Wavelet, WaveletHasher};

/// Median of a set of coefficients; the mean of the two middle values
/// when the count is even.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Arithmetic mean
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
