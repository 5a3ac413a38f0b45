//! Difference Hash (dHash), horizontal and vertical.
//!
//! dHash works by:
//! 1. Resizing the image to (hash_size+1) x hash_size (or hash_size x
//!    (hash_size+1) for the vertical variant)
//! 2. Converting to grayscale
//! 3. Comparing each pixel to its right (or lower) neighbour
//!
//! This captures the relative gradient of brightness changes. The
//! image_hasher crate provides both gradient directions.

use super::super::traits::{Algorithm, Fingerprint, HashAlgorithm};
use crate::error::HashError;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};

/// Which neighbours are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Left to right (`dhash`)
    Horizontal,
    /// Top to bottom (`dhash-vert`)
    Vertical,
}

/// Difference Hash (dHash) implementation
pub struct DifferenceHasher {
    hash_size: u32,
    direction: Direction,
    hasher: image_hasher::Hasher,
}

impl DifferenceHasher {
    /// Create a new dHash hasher
    pub fn new(hash_size: u32, direction: Direction) -> Self {
        let alg = match direction {
            Direction::Horizontal => HashAlg::Gradient,
            Direction::Vertical => HashAlg::VertGradient,
        };

        let hasher = HasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(alg)
            .to_hasher();

        Self {
            hash_size,
            direction,
            hasher,
        }
    }
}

impl HashAlgorithm for DifferenceHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let hash = self.hasher.hash_image(image);
        let bit_len = self.hash_size as usize * self.hash_size as usize;

        Ok(Fingerprint::new(
            self.kind(),
            hash.as_bytes().to_vec(),
            bit_len,
        ))
    }

    fn kind(&self) -> Algorithm {
        match self.direction {
            Direction::Horizontal => Algorithm::Dhash,
            Direction::Vertical => Algorithm::DhashVert,
        }
    }
}
