//! # Hasher Module
//!
//! Computes perceptual fingerprints for images.
//!
//! ## Supported Algorithms
//! - **ahash** - average hash, fastest
//! - **phash / phash-simple** - DCT based, robust to edits
//! - **dhash / dhash-vert** - horizontal or vertical gradients
//! - **whash-haar / whash-db4** - wavelet decomposition
//! - **colorhash** - HSV color distribution, ignores structure
//!
//! ## How It Works
//! 1. Read the file (memory-mapped when large)
//! 2. Decode (`zune-jpeg` for JPEG, `image` otherwise)
//! 3. Shrink to a small grayscale grid (`fast_image_resize`)
//! 4. Derive bits from pixel relationships
//!
//! Fingerprints are compared with Hamming distance.
//!
//! ## Example
//! ```rust,ignore
//! use imagesearch::core::hasher::{Algorithm, AlgorithmConfig, FingerprintProvider, ImageFingerprinter};
//!
//! let config = AlgorithmConfig::parse(Algorithm::Phash, "hash_size=16")?;
//! let fingerprint = ImageFingerprinter::new().compute_file(&path, &config)?;
//! ```

mod algorithms;
pub mod fast_decode;
pub mod fast_resize;
pub mod params;
pub mod source;
mod traits;

pub use algorithms::{
    AverageHasher, ColorHasher, DctAxes, DifferenceHasher, Direction, PerceptualHasher, Wavelet,
    WaveletHasher,
};
pub use params::{AlgorithmConfig, ParameterSpec, WaveletParams};
pub use traits::{Algorithm, Fingerprint, FingerprintProvider, HashAlgorithm};

use crate::error::HashError;
use fast_decode::FastDecoder;

/// Build the hasher for a validated configuration
pub fn build_hasher(config: &AlgorithmConfig) -> Box<dyn HashAlgorithm> {
    match *config {
        AlgorithmConfig::Ahash { hash_size } => Box::new(AverageHasher::new(hash_size)),
        AlgorithmConfig::Phash {
            hash_size,
            highfreq_factor,
        } => Box::new(PerceptualHasher::new(
            hash_size,
            highfreq_factor,
            DctAxes::Both,
        )),
        AlgorithmConfig::PhashSimple {
            hash_size,
            highfreq_factor,
        } => Box::new(PerceptualHasher::new(
            hash_size,
            highfreq_factor,
            DctAxes::Rows,
        )),
        AlgorithmConfig::Dhash { hash_size } => {
            Box::new(DifferenceHasher::new(hash_size, Direction::Horizontal))
        }
        AlgorithmConfig::DhashVert { hash_size } => {
            Box::new(DifferenceHasher::new(hash_size, Direction::Vertical))
        }
        AlgorithmConfig::WhashHaar(params) => Box::new(WaveletHasher::new(Wavelet::Haar, params)),
        AlgorithmConfig::WhashDb4(params) => {
            Box::new(WaveletHasher::new(Wavelet::Daubechies4, params))
        }
        AlgorithmConfig::Colorhash { binbits } => Box::new(ColorHasher::new(binbits)),
    }
}

/// Fingerprints real image data: decode, then hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFingerprinter;

impl ImageFingerprinter {
    pub fn new() -> Self {
        Self
    }
}

impl FingerprintProvider for ImageFingerprinter {
    fn compute(&self, image: &[u8], config: &AlgorithmConfig) -> Result<Fingerprint, HashError> {
        config.validate()?;

        let decoded = FastDecoder::decode(image)?;
        tracing::trace!(
            width = decoded.width(),
            height = decoded.height(),
            algorithm = %config.algorithm(),
            "decoded image"
        );

        build_hasher(config).hash_image(&decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamError;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_fn(48, 32, |x, y| {
            Rgb([(x * 5) as u8, (y * 7) as u8, ((x + y) * 3) as u8])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn build_hasher_matches_configured_algorithm() {
        for algorithm in Algorithm::ALL {
            let hasher = build_hasher(&AlgorithmConfig::new(algorithm));
            assert_eq!(hasher.kind(), algorithm);
        }
    }

    #[test]
    fn every_algorithm_fingerprints_png_bytes() {
        let bytes = png_bytes();
        let fingerprinter = ImageFingerprinter::new();

        for algorithm in Algorithm::ALL {
            let config = AlgorithmConfig::new(algorithm);
            let fingerprint = fingerprinter.compute(&bytes, &config).unwrap();

            assert_eq!(fingerprint.algorithm(), algorithm);
            assert!(fingerprint.bit_len() > 0);
        }
    }

    #[test]
    fn same_bytes_give_same_fingerprint() {
        let bytes = png_bytes();
        let config = AlgorithmConfig::parse(Algorithm::Phash, "hash_size=16").unwrap();

        let a = ImageFingerprinter.compute(&bytes, &config).unwrap();
        let b = ImageFingerprinter.compute(&bytes, &config).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.bit_len(), 256);
    }

    #[test]
    fn invalid_config_is_reported_as_parameter_error() {
        let config = AlgorithmConfig::Phash {
            hash_size: 65536,
            highfreq_factor: 65536,
        };
        let result = ImageFingerprinter.compute(&png_bytes(), &config);

        assert!(matches!(
            result,
            Err(HashError::InvalidParameter(ParamError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = ImageFingerprinter.compute(b"not an image", &AlgorithmConfig::default());
        assert!(matches!(result, Err(HashError::Decode { .. })));
    }

    #[test]
    fn compute_file_reports_missing_path() {
        let result = ImageFingerprinter.compute_file(
            std::path::Path::new("/definitely/not/here.png"),
            &AlgorithmConfig::default(),
        );
        assert!(matches!(result, Err(HashError::NotFound { .. })));
    }
}
