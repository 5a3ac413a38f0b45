//! Fingerprint types and the traits at the hashing boundary.

use super::params::AlgorithmConfig;
use super::source::read_file_bytes;
use crate::error::{CompareError, HashError};
use image::DynamicImage;
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;
use std::str::FromStr;

/// Available fingerprint algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Average hashing
    Ahash,
    /// 2-axis perceptual hashing
    Phash,
    /// 1-axis perceptual hashing
    PhashSimple,
    /// Horizontal difference hashing
    Dhash,
    /// Vertical difference hashing
    DhashVert,
    /// Haar wavelet hashing
    WhashHaar,
    /// Daubechies wavelet hashing
    WhashDb4,
    /// HSV color hashing
    Colorhash,
}

impl Algorithm {
    /// Every supported algorithm, in listing order
    pub const ALL: [Algorithm; 8] = [
        Algorithm::Ahash,
        Algorithm::Phash,
        Algorithm::PhashSimple,
        Algorithm::Dhash,
        Algorithm::DhashVert,
        Algorithm::WhashHaar,
        Algorithm::WhashDb4,
        Algorithm::Colorhash,
    ];

    /// The command-line name of the algorithm
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Ahash => "ahash",
            Algorithm::Phash => "phash",
            Algorithm::PhashSimple => "phash-simple",
            Algorithm::Dhash => "dhash",
            Algorithm::DhashVert => "dhash-vert",
            Algorithm::WhashHaar => "whash-haar",
            Algorithm::WhashDb4 => "whash-db4",
            Algorithm::Colorhash => "colorhash",
        }
    }

    /// Get a human-readable description of the algorithm
    pub fn description(&self) -> &'static str {
        match self {
            Algorithm::Ahash => "Average hashing",
            Algorithm::Phash => "2-axis perceptual hashing",
            Algorithm::PhashSimple => "1-axis perceptual hashing",
            Algorithm::Dhash => "Horizontal difference hashing",
            Algorithm::DhashVert => "Vertical difference hashing",
            Algorithm::WhashHaar => "Haar wavelet hashing",
            Algorithm::WhashDb4 => "Daubechies wavelet hashing",
            Algorithm::Colorhash => "HSV color hashing",
        }
    }

    /// Comma-separated list of all algorithm names
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| {
                format!(
                    "no algorithm named '{}' (choose from: {})",
                    s,
                    Self::supported_names()
                )
            })
    }
}

/// A computed image fingerprint.
///
/// Bits are packed most-significant first; trailing bits of the last byte
/// are zero. Two fingerprints are only comparable when they come from the
/// same algorithm and have the same bit length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    algorithm: Algorithm,
    bit_len: usize,
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Create a fingerprint from packed bytes
    pub fn new(algorithm: Algorithm, bytes: Vec<u8>, bit_len: usize) -> Self {
        Self {
            algorithm,
            bit_len,
            bytes,
        }
    }

    /// Create a fingerprint by packing a sequence of bits
    pub fn from_bits<I>(algorithm: Algorithm, bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut bytes = Vec::new();
        let mut current_byte: u8 = 0;
        let mut bit_position = 0;
        let mut bit_len = 0;

        for bit in bits {
            if bit {
                current_byte |= 1 << (7 - bit_position);
            }

            bit_position += 1;
            bit_len += 1;

            if bit_position == 8 {
                bytes.push(current_byte);
                current_byte = 0;
                bit_position = 0;
            }
        }

        if bit_position > 0 {
            bytes.push(current_byte);
        }

        Self {
            algorithm,
            bit_len,
            bytes,
        }
    }

    /// The algorithm that produced this fingerprint
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Number of meaningful bits
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// The packed fingerprint bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal rendering of the packed bytes
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Whether a distance to `other` is meaningful
    pub fn is_comparable(&self, other: &Fingerprint) -> bool {
        self.algorithm == other.algorithm && self.bit_len == other.bit_len
    }

    /// Hamming distance: the number of differing bits
    pub fn distance(&self, other: &Fingerprint) -> Result<u32, CompareError> {
        if !self.is_comparable(other) {
            return Err(CompareError::IncompatibleFingerprint {
                left_algorithm: self.algorithm,
                left_bits: self.bit_len,
                right_algorithm: other.algorithm,
                right_bits: other.bit_len,
            });
        }

        Ok(self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Trait for fingerprint algorithm implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a fingerprint from an already-decoded image
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError>;

    /// Get the algorithm kind
    fn kind(&self) -> Algorithm;
}

/// The fingerprinting capability the search and dupe engines depend on.
///
/// Implement this to substitute fingerprints in tests without decoding
/// real images.
pub trait FingerprintProvider: Send + Sync {
    /// Compute the fingerprint of encoded image bytes
    fn compute(&self, image: &[u8], config: &AlgorithmConfig) -> Result<Fingerprint, HashError>;

    /// Compute the fingerprint of the image stored at `path`.
    ///
    /// Large files are memory-mapped rather than copied.
    fn compute_file(&self, path: &Path, config: &AlgorithmConfig) -> Result<Fingerprint, HashError> {
        let bytes = read_file_bytes(path)?;
        self.compute(&bytes, config).map_err(|e| e.with_path(path))
    }
}
