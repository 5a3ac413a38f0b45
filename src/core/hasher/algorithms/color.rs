//! Color Hash.
//!
//! Unlike the other algorithms this one ignores structure and looks only at
//! the color distribution of every pixel:
//! - fraction of black pixels (luma below 32)
//! - fraction of gray pixels (saturation below 85)
//! - a 12-bin hue histogram of faint colors (saturation below 170)
//! - a 12-bin hue histogram of bright colors (saturation above 170)
//!
//! Each of the 14 values is quantized to `binbits` bits, so the fingerprint
//! is 14 * binbits bits long.

use super::super::traits::{Algorithm, Fingerprint, HashAlgorithm};
use crate::error::HashError;
use image::DynamicImage;

const HUE_BINS: usize = 12;
const BLACK_LUMA: u8 = 32;
const GRAY_SATURATION: u8 = 85;
const BRIGHT_SATURATION: u8 = 170;

/// Color Hash implementation
pub struct ColorHasher {
    binbits: u32,
}

impl ColorHasher {
    /// Create a new color hasher
    pub fn new(binbits: u32) -> Self {
        Self { binbits }
    }
}

impl HashAlgorithm for ColorHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let rgb = image.to_rgb8();
        let total = rgb.pixels().len();
        if total == 0 {
            return Err(HashError::Computation("image has no pixels".to_string()));
        }

        let mut black = 0usize;
        let mut gray = 0usize;
        let mut colors = 0usize;
        let mut faint = [0usize; HUE_BINS];
        let mut bright = [0usize; HUE_BINS];

        for pixel in rgb.pixels() {
            let [r, g, b] = pixel.0;
            if luma(r, g, b) < BLACK_LUMA {
                black += 1;
                continue;
            }

            let (hue, saturation) = hue_saturation(r, g, b);
            if saturation < GRAY_SATURATION {
                gray += 1;
                continue;
            }

            colors += 1;
            if saturation < BRIGHT_SATURATION {
                faint[hue_bin(hue)] += 1;
            } else if saturation > BRIGHT_SATURATION {
                bright[hue_bin(hue)] += 1;
            }
        }

        let max_value = 1u64 << self.binbits;
        let quantize = |numerator: usize, denominator: usize| -> u64 {
            let scaled = (numerator as f64 * max_value as f64 / denominator as f64) as u64;
            scaled.min(max_value - 1)
        };

        let colors = colors.max(1);
        let mut values = Vec::with_capacity(2 + 2 * HUE_BINS);
        values.push(quantize(black, total));
        values.push(quantize(gray, total));
        values.extend(faint.iter().map(|&count| quantize(count, colors)));
        values.extend(bright.iter().map(|&count| quantize(count, colors)));

        let binbits = self.binbits;
        let bits = values
            .into_iter()
            .flat_map(move |value| (0..binbits).map(move |i| expand_bit(value, binbits, i)));

        Ok(Fingerprint::from_bits(Algorithm::Colorhash, bits))
    }

    fn kind(&self) -> Algorithm {
        Algorithm::Colorhash
    }
}

/// ITU-R 601-2 luma with 16-bit fixed point rounding
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Hue and saturation on a 0..=255 scale, truncated
fn hue_saturation(r: u8, g: u8, b: u8) -> (u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return (0, 0);
    }

    let chroma = (max - min) as f32;
    let saturation = chroma / max as f32;
    let rc = (max - r) as f32 / chroma;
    let gc = (max - g) as f32 / chroma;
    let bc = (max - b) as f32 / chroma;

    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    let h = (h / 6.0 + 1.0) % 1.0;

    (
        (h * 255.0).clamp(0.0, 255.0) as u8,
        (saturation * 255.0).clamp(0.0, 255.0) as u8,
    )
}

/// Twelve equal-width bins over 0..=255, the last one closed
fn hue_bin(hue: u8) -> usize {
    ((hue as f32 / (255.0 / HUE_BINS as f32)) as usize).min(HUE_BINS - 1)
}

fn expand_bit(value: u64, binbits: u32, i: u32) -> bool {
    (value >> (binbits - i - 1)) % (1u64 << (binbits - i)) > 0
}
