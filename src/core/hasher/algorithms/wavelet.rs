//! Wavelet Hash (wHash).
//!
//! wHash works by:
//! 1. Resizing the image to image_scale x image_scale grayscale (a power of
//!    2, by default the largest one fitting the smaller image side)
//! 2. Optionally removing the coarsest Haar approximation coefficient,
//!    which for an orthonormal Haar basis is the same as subtracting the
//!    mean intensity
//! 3. Decomposing with the chosen wavelet until the approximation band is
//!    about hash_size wide
//! 4. Setting a bit for every approximation coefficient above the median
//!
//! Decomposition uses half-sample symmetric extension at the borders.
//! Haar never needs it on power-of-2 input; Daubechies-4 does, so its
//! approximation band ends up somewhat larger than hash_size.

use super::super::fast_resize::{resize_to_grayscale, to_matrix};
use super::super::params::WaveletParams;
use super::super::traits::{Algorithm, Fingerprint, HashAlgorithm};
use super::median;
use crate::error::HashError;
use image::DynamicImage;
use std::f64::consts::FRAC_1_SQRT_2;

const HAAR_LOW_PASS: [f64; 2] = [FRAC_1_SQRT_2, FRAC_1_SQRT_2];

const DB4_LOW_PASS: [f64; 8] = [
    -0.010_597_401_784_997_278,
    0.032_883_011_666_982_945,
    0.030_841_381_835_986_965,
    -0.187_034_811_718_881_14,
    -0.027_983_769_416_983_85,
    0.630_880_767_929_590_4,
    0.714_846_570_552_541_5,
    0.230_377_813_308_855_23,
];

/// Wavelet family used for the decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wavelet {
    Haar,
    Daubechies4,
}

impl Wavelet {
    fn low_pass(&self) -> &'static [f64] {
        match self {
            Wavelet::Haar => &HAAR_LOW_PASS,
            Wavelet::Daubechies4 => &DB4_LOW_PASS,
        }
    }
}

/// Wavelet Hash (wHash) implementation
pub struct WaveletHasher {
    wavelet: Wavelet,
    params: WaveletParams,
}

impl WaveletHasher {
    /// Create a new wHash hasher
    pub fn new(wavelet: Wavelet, params: WaveletParams) -> Self {
        Self { wavelet, params }
    }

    fn image_scale(&self, image: &DynamicImage) -> u32 {
        self.params.image_scale.unwrap_or_else(|| {
            let smaller_side = image.width().min(image.height()).max(1);
            let natural = 1u32 << (31 - smaller_side.leading_zeros());
            natural.max(self.params.hash_size)
        })
    }
}

impl HashAlgorithm for WaveletHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let hash_size = self.params.hash_size;
        let image_scale = self.image_scale(image);

        if !hash_size.is_power_of_two() || !image_scale.is_power_of_two() || image_scale < hash_size
        {
            return Err(HashError::Computation(format!(
                "wavelet hash needs power-of-2 sizes with image_scale >= hash_size, got {} and {}",
                image_scale, hash_size
            )));
        }

        let dwt_level = image_scale.trailing_zeros() - hash_size.trailing_zeros();

        let gray = resize_to_grayscale(image, image_scale, image_scale)?;
        let mut pixels = to_matrix(&gray, 1.0 / 255.0);

        if self.params.remove_max_haar_ll {
            let total: f64 = pixels.iter().flatten().sum();
            let average = total / (image_scale as f64 * image_scale as f64);
            for value in pixels.iter_mut().flatten() {
                *value -= average;
            }
        }

        let mut band = pixels;
        for _ in 0..dwt_level {
            band = approximation_2d(&band, self.wavelet.low_pass());
        }

        let coefficients: Vec<f64> = band.into_iter().flatten().collect();
        let pivot = median(&coefficients);

        Ok(Fingerprint::from_bits(
            self.kind(),
            coefficients.iter().map(|&c| c > pivot),
        ))
    }

    fn kind(&self) -> Algorithm {
        match self.wavelet {
            Wavelet::Haar => Algorithm::WhashHaar,
            Wavelet::Daubechies4 => Algorithm::WhashDb4,
        }
    }
}

/// One level of 2-D decomposition, keeping only the low/low band
fn approximation_2d(matrix: &[Vec<f64>], filter: &[f64]) -> Vec<Vec<f64>> {
    let rows: Vec<Vec<f64>> = matrix.iter().map(|row| approximation(row, filter)).collect();

    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    let columns: Vec<Vec<f64>> = (0..width)
        .map(|c| {
            let column: Vec<f64> = rows.iter().map(|row| row[c]).collect();
            approximation(&column, filter)
        })
        .collect();

    let height = columns.first().map(|c| c.len()).unwrap_or(0);
    (0..height)
        .map(|r| columns.iter().map(|column| column[r]).collect())
        .collect()
}

/// Low-pass filter and downsample by 2: `out[o] = sum(h[j] * x[2o + 1 - j])`
fn approximation(signal: &[f64], filter: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let out_len = (n + filter.len() - 1) / 2;

    (0..out_len)
        .map(|o| {
            let i = (2 * o + 1) as isize;
            filter
                .iter()
                .enumerate()
                .map(|(j, h)| h * signal[symmetric_index(i - j as isize, n)])
                .sum()
        })
        .collect()
}

/// Map an out-of-range index into `0..n` by half-sample symmetric reflection
fn symmetric_index(index: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let mut k = index.rem_euclid(period);
    if k >= n {
        k = period - 1 - k;
    }
    k as usize
}
