//! Average Hash (aHash).
//!
//! aHash works by:
//! 1. Resizing the image to hash_size x hash_size
//! 2. Converting to grayscale
//! 3. Computing the average brightness
//! 4. For each pixel: if brighter than average, set bit to 1, else 0
//!
//! The image_hasher crate provides the implementation.

use super::super::traits::{Algorithm, Fingerprint, HashAlgorithm};
use crate::error::HashError;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};

/// Average Hash (aHash) implementation
pub struct AverageHasher {
    hash_size: u32,
    hasher: image_hasher::Hasher,
}

impl AverageHasher {
    /// Create a new aHash hasher
    pub fn new(hash_size: u32) -> Self {
        let hasher = HasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Mean)
            .to_hasher();

        Self { hash_size, hasher }
    }
}

impl HashAlgorithm for AverageHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let hash = self.hasher.hash_image(image);
        let bit_len = self.hash_size as usize * self.hash_size as usize;

        Ok(Fingerprint::new(
            Algorithm::Ahash,
            hash.as_bytes().to_vec(),
            bit_len,
        ))
    }

    fn kind(&self) -> Algorithm {
        Algorithm::Ahash
    }
}
