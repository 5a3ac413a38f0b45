//! Perceptual Hash (pHash) implementations.
//!
//! pHash uses the Discrete Cosine Transform (DCT) to extract frequency
//! information from the image. This makes it more robust to:
//! - Scaling
//! - Brightness/contrast changes
//! - Compression artifacts
//!
//! Two variants exist:
//! - `phash`: 2-D DCT, top-left hash_size x hash_size block compared to
//!   its median
//! - `phash-simple`: DCT along rows only, block skipping the DC column
//!   compared to its mean
//!
//! The image is first resized to (hash_size * highfreq_factor) squared.

use super::super::fast_resize::{resize_to_grayscale, to_matrix};
use super::super::traits::{Algorithm, Fingerprint, HashAlgorithm};
use super::{mean, median};
use crate::error::HashError;
use image::DynamicImage;
use std::f64::consts::PI;

/// Which axes the DCT is applied along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DctAxes {
    /// Columns, then rows (`phash`)
    Both,
    /// Rows only (`phash-simple`)
    Rows,
}

/// Perceptual Hash (pHash) implementation using a DCT
pub struct PerceptualHasher {
    hash_size: u32,
    highfreq_factor: u32,
    axes: DctAxes,
}

impl PerceptualHasher {
    /// Create a new pHash hasher
    pub fn new(hash_size: u32, highfreq_factor: u32, axes: DctAxes) -> Self {
        Self {
            hash_size,
            highfreq_factor,
            axes,
        }
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let img_size = self
            .hash_size
            .checked_mul(self.highfreq_factor)
            .ok_or_else(|| {
                HashError::Computation(format!(
                    "resize side {} * {} overflows",
                    self.hash_size, self.highfreq_factor
                ))
            })?;
        let gray = resize_to_grayscale(image, img_size, img_size)?;
        let pixels = to_matrix(&gray, 1.0);

        let plan = DctPlan::new(img_size as usize);
        let n = self.hash_size as usize;

        let low_freq: Vec<f64> = match self.axes {
            DctAxes::Both => {
                let transformed = plan.transform_rows(&transpose(&plan.transform_rows(
                    &transpose(&pixels),
                )));
                transformed
                    .iter()
                    .take(n)
                    .flat_map(|row| row.iter().take(n).copied())
                    .collect()
            }
            DctAxes::Rows => {
                let transformed = plan.transform_rows(&pixels);
                transformed
                    .iter()
                    .take(n)
                    .flat_map(|row| row.iter().skip(1).take(n).copied())
                    .collect()
            }
        };

        if low_freq.len() != n * n {
            return Err(HashError::Computation(format!(
                "DCT block has {} coefficients, expected {}",
                low_freq.len(),
                n * n
            )));
        }

        let pivot = match self.axes {
            DctAxes::Both => median(&low_freq),
            DctAxes::Rows => mean(&low_freq),
        };

        Ok(Fingerprint::from_bits(
            self.kind(),
            low_freq.iter().map(|&c| c > pivot),
        ))
    }

    fn kind(&self) -> Algorithm {
        match self.axes {
            DctAxes::Both => Algorithm::Phash,
            DctAxes::Rows => Algorithm::PhashSimple,
        }
    }
}

/// Precomputed cosine table for an unnormalized DCT-II of one length:
/// `y[k] = 2 * sum(x[i] * cos(pi * k * (2i + 1) / 2N))`
struct DctPlan {
    len: usize,
    cosines: Vec<f64>,
}

impl DctPlan {
    fn new(len: usize) -> Self {
        let mut cosines = Vec::with_capacity(len * len);
        for k in 0..len {
            for i in 0..len {
                cosines.push((PI * k as f64 * (2 * i + 1) as f64 / (2 * len) as f64).cos());
            }
        }
        Self { len, cosines }
    }

    fn transform(&self, input: &[f64]) -> Vec<f64> {
        (0..self.len)
            .map(|k| {
                let row = &self.cosines[k * self.len..(k + 1) * self.len];
                2.0 * input.iter().zip(row).map(|(x, c)| x * c).sum::<f64>()
            })
            .collect()
    }

    fn transform_rows(&self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
        matrix.iter().map(|row| self.transform(row)).collect()
    }
}

fn transpose(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let cols = matrix.first().map(|r| r.len()).unwrap_or(0);
    (0..cols)
        .map(|c| matrix.iter().map(|row| row[c]).collect())
        .collect()
}
