//! Structured, per-algorithm fingerprint parameters.
//!
//! Parameters arrive from the command line as `key=value,key=value` and are
//! validated here, once, before any image is touched.

use super::traits::Algorithm;
use crate::error::ParamError;
use std::collections::HashSet;

/// Default fingerprint side length
pub const DEFAULT_HASH_SIZE: u32 = 8;
/// Default DCT oversampling factor for the perceptual hashes
pub const DEFAULT_HIGHFREQ_FACTOR: u32 = 4;
/// Default bits per bin for color hashing
pub const DEFAULT_BINBITS: u32 = 3;

const MAX_BINBITS: u32 = 16;

/// Smallest accepted hash_size
pub const MIN_HASH_SIZE: u32 = 2;
/// Largest accepted hash_size
pub const MAX_HASH_SIZE: u32 = 1024;
/// Largest side the perceptual hashes resize to (hash_size * highfreq_factor)
pub const MAX_DCT_SIDE: u32 = 1024;
/// Largest explicit image_scale for the wavelet hashes
pub const MAX_IMAGE_SCALE: u32 = 4096;

/// Description of one accepted parameter, for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: &'static str,
    pub help: &'static str,
}

const HASH_SIZE: ParameterSpec = ParameterSpec {
    name: "hash_size",
    default: "8",
    help: "Side length of the hash grid, 2 to 1024; the hash has hash_size^2 bits.",
};

const HIGHFREQ_FACTOR: ParameterSpec = ParameterSpec {
    name: "highfreq_factor",
    default: "4",
    help: "The image is resized to hash_size * highfreq_factor before the DCT.",
};

const IMAGE_SCALE: ParameterSpec = ParameterSpec {
    name: "image_scale",
    default: "auto",
    help: "Power of 2 the image is resized to. Defaults to the largest power of 2 \
           not exceeding the smaller image side.",
};

const REMOVE_MAX_HAAR_LL: ParameterSpec = ParameterSpec {
    name: "remove_max_haar_ll",
    default: "true",
    help: "Remove the lowest low level (LL) frequency using the Haar wavelet. \
           An empty value (remove_max_haar_ll=) means false.",
};

const BINBITS: ParameterSpec = ParameterSpec {
    name: "binbits",
    default: "3",
    help: "Number of bits used to encode each bin fraction.",
};

impl Algorithm {
    /// Parameters accepted by this algorithm
    pub fn parameters(&self) -> &'static [ParameterSpec] {
        match self {
            Algorithm::Ahash | Algorithm::Dhash | Algorithm::DhashVert => &[HASH_SIZE],
            Algorithm::Phash | Algorithm::PhashSimple => &[HASH_SIZE, HIGHFREQ_FACTOR],
            Algorithm::WhashHaar | Algorithm::WhashDb4 => {
                &[HASH_SIZE, IMAGE_SCALE, REMOVE_MAX_HAAR_LL]
            }
            Algorithm::Colorhash => &[BINBITS],
        }
    }
}

/// Parameters shared by both wavelet hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaveletParams {
    pub hash_size: u32,
    pub image_scale: Option<u32>,
    pub remove_max_haar_ll: bool,
}

impl Default for WaveletParams {
    fn default() -> Self {
        Self {
            hash_size: DEFAULT_HASH_SIZE,
            image_scale: None,
            remove_max_haar_ll: true,
        }
    }
}

/// A fully-validated algorithm selection with its parameters.
///
/// One configuration is applied to every image in a run, so fingerprints
/// produced under it are always mutually comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmConfig {
    Ahash { hash_size: u32 },
    Phash { hash_size: u32, highfreq_factor: u32 },
    PhashSimple { hash_size: u32, highfreq_factor: u32 },
    Dhash { hash_size: u32 },
    DhashVert { hash_size: u32 },
    WhashHaar(WaveletParams),
    WhashDb4(WaveletParams),
    Colorhash { binbits: u32 },
}

impl AlgorithmConfig {
    /// The default configuration for an algorithm
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Ahash => AlgorithmConfig::Ahash {
                hash_size: DEFAULT_HASH_SIZE,
            },
            Algorithm::Phash => AlgorithmConfig::Phash {
                hash_size: DEFAULT_HASH_SIZE,
                highfreq_factor: DEFAULT_HIGHFREQ_FACTOR,
            },
            Algorithm::PhashSimple => AlgorithmConfig::PhashSimple {
                hash_size: DEFAULT_HASH_SIZE,
                highfreq_factor: DEFAULT_HIGHFREQ_FACTOR,
            },
            Algorithm::Dhash => AlgorithmConfig::Dhash {
                hash_size: DEFAULT_HASH_SIZE,
            },
            Algorithm::DhashVert => AlgorithmConfig::DhashVert {
                hash_size: DEFAULT_HASH_SIZE,
            },
            Algorithm::WhashHaar => AlgorithmConfig::WhashHaar(WaveletParams::default()),
            Algorithm::WhashDb4 => AlgorithmConfig::WhashDb4(WaveletParams::default()),
            Algorithm::Colorhash => AlgorithmConfig::Colorhash {
                binbits: DEFAULT_BINBITS,
            },
        }
    }

    /// Parse a `key=value,key=value` parameter string for `algorithm`.
    ///
    /// Empty segments are ignored, so an empty string yields the defaults.
    pub fn parse(algorithm: Algorithm, params: &str) -> Result<Self, ParamError> {
        let mut pairs = Vec::new();
        for segment in params.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ParamError::Malformed(segment.to_string()))?;
            pairs.push((key.trim(), value.trim()));
        }
        Self::from_pairs(algorithm, pairs)
    }

    /// Build a configuration from key/value pairs, rejecting unknown keys
    pub fn from_pairs<'a, I>(algorithm: Algorithm, pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::new(algorithm);
        let mut seen = HashSet::new();

        for (key, value) in pairs {
            if !algorithm.parameters().iter().any(|p| p.name == key) {
                return Err(ParamError::UnknownKey {
                    algorithm,
                    key: key.to_string(),
                    accepted: algorithm
                        .parameters()
                        .iter()
                        .map(|p| p.name)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            if !seen.insert(key) {
                return Err(ParamError::Repeated(key.to_string()));
            }
            config.set(key, value)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ParamError> {
        match (self, key) {
            (
                AlgorithmConfig::Ahash { hash_size }
                | AlgorithmConfig::Dhash { hash_size }
                | AlgorithmConfig::DhashVert { hash_size }
                | AlgorithmConfig::Phash { hash_size, .. }
                | AlgorithmConfig::PhashSimple { hash_size, .. }
                | AlgorithmConfig::WhashHaar(WaveletParams { hash_size, .. })
                | AlgorithmConfig::WhashDb4(WaveletParams { hash_size, .. }),
                "hash_size",
            ) => *hash_size = parse_u32(key, value)?,
            (
                AlgorithmConfig::Phash {
                    highfreq_factor, ..
                }
                | AlgorithmConfig::PhashSimple {
                    highfreq_factor, ..
                },
                "highfreq_factor",
            ) => *highfreq_factor = parse_u32(key, value)?,
            (
                AlgorithmConfig::WhashHaar(params) | AlgorithmConfig::WhashDb4(params),
                "image_scale",
            ) => params.image_scale = Some(parse_u32(key, value)?),
            (
                AlgorithmConfig::WhashHaar(params) | AlgorithmConfig::WhashDb4(params),
                "remove_max_haar_ll",
            ) => params.remove_max_haar_ll = parse_bool(key, value)?,
            (AlgorithmConfig::Colorhash { binbits }, "binbits") => {
                *binbits = parse_u32(key, value)?
            }
            (config, _) => {
                let algorithm = config.algorithm();
                return Err(ParamError::UnknownKey {
                    algorithm,
                    key: key.to_string(),
                    accepted: algorithm
                        .parameters()
                        .iter()
                        .map(|p| p.name)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
        Ok(())
    }

    /// Check value ranges for the selected algorithm
    pub fn validate(&self) -> Result<(), ParamError> {
        match *self {
            AlgorithmConfig::Ahash { hash_size }
            | AlgorithmConfig::Dhash { hash_size }
            | AlgorithmConfig::DhashVert { hash_size } => check_hash_size(hash_size),
            AlgorithmConfig::Phash {
                hash_size,
                highfreq_factor,
            } => {
                check_hash_size(hash_size)?;
                require_positive("highfreq_factor", highfreq_factor)?;
                check_dct_side(hash_size, highfreq_factor)
            }
            AlgorithmConfig::PhashSimple {
                hash_size,
                highfreq_factor,
            } => {
                check_hash_size(hash_size)?;
                // The low-frequency block skips the DC column, so the DCT
                // needs at least hash_size + 1 columns.
                if highfreq_factor < 2 {
                    return Err(invalid(
                        "highfreq_factor",
                        highfreq_factor,
                        "must be at least 2 for phash-simple",
                    ));
                }
                check_dct_side(hash_size, highfreq_factor)
            }
            AlgorithmConfig::WhashHaar(params) | AlgorithmConfig::WhashDb4(params) => {
                check_hash_size(params.hash_size)?;
                if !params.hash_size.is_power_of_two() {
                    return Err(invalid(
                        "hash_size",
                        params.hash_size,
                        "must be a power of 2",
                    ));
                }
                if let Some(scale) = params.image_scale {
                    if !scale.is_power_of_two() {
                        return Err(invalid("image_scale", scale, "must be a power of 2"));
                    }
                    if scale > MAX_IMAGE_SCALE {
                        return Err(invalid(
                            "image_scale",
                            scale,
                            &format!("must not exceed {}", MAX_IMAGE_SCALE),
                        ));
                    }
                    if scale < params.hash_size {
                        return Err(invalid(
                            "image_scale",
                            scale,
                            "must not be smaller than hash_size",
                        ));
                    }
                }
                Ok(())
            }
            AlgorithmConfig::Colorhash { binbits } => {
                if binbits == 0 || binbits > MAX_BINBITS {
                    return Err(invalid(
                        "binbits",
                        binbits,
                        &format!("must be between 1 and {}", MAX_BINBITS),
                    ));
                }
                Ok(())
            }
        }
    }

    /// The algorithm this configuration selects
    pub fn algorithm(&self) -> Algorithm {
        match self {
            AlgorithmConfig::Ahash { .. } => Algorithm::Ahash,
            AlgorithmConfig::Phash { .. } => Algorithm::Phash,
            AlgorithmConfig::PhashSimple { .. } => Algorithm::PhashSimple,
            AlgorithmConfig::Dhash { .. } => Algorithm::Dhash,
            AlgorithmConfig::DhashVert { .. } => Algorithm::DhashVert,
            AlgorithmConfig::WhashHaar(_) => Algorithm::WhashHaar,
            AlgorithmConfig::WhashDb4(_) => Algorithm::WhashDb4,
            AlgorithmConfig::Colorhash { .. } => Algorithm::Colorhash,
        }
    }
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self::new(Algorithm::Ahash)
    }
}

impl std::fmt::Display for AlgorithmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.algorithm())?;
        match self {
            AlgorithmConfig::Ahash { hash_size }
            | AlgorithmConfig::Dhash { hash_size }
            | AlgorithmConfig::DhashVert { hash_size } => write!(f, "hash_size={}", hash_size)?,
            AlgorithmConfig::Phash {
                hash_size,
                highfreq_factor,
            }
            | AlgorithmConfig::PhashSimple {
                hash_size,
                highfreq_factor,
            } => write!(
                f,
                "hash_size={}, highfreq_factor={}",
                hash_size, highfreq_factor
            )?,
            AlgorithmConfig::WhashHaar(params) | AlgorithmConfig::WhashDb4(params) => {
                write!(f, "hash_size={}, image_scale=", params.hash_size)?;
                match params.image_scale {
                    Some(scale) => write!(f, "{}", scale)?,
                    None => write!(f, "auto")?,
                }
                write!(f, ", remove_max_haar_ll={}", params.remove_max_haar_ll)?;
            }
            AlgorithmConfig::Colorhash { binbits } => write!(f, "binbits={}", binbits)?,
        }
        write!(f, ")")
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ParamError> {
    value.parse::<u32>().map_err(|_| ParamError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ParamError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "" | "false" | "no" | "0" => Ok(false),
        _ => Err(ParamError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn require_positive(key: &str, value: u32) -> Result<(), ParamError> {
    if value == 0 {
        return Err(invalid(key, value, "must be greater than 0"));
    }
    Ok(())
}

fn check_hash_size(hash_size: u32) -> Result<(), ParamError> {
    if !(MIN_HASH_SIZE..=MAX_HASH_SIZE).contains(&hash_size) {
        return Err(invalid(
            "hash_size",
            hash_size,
            &format!("must be between {} and {}", MIN_HASH_SIZE, MAX_HASH_SIZE),
        ));
    }
    Ok(())
}

fn check_dct_side(hash_size: u32, highfreq_factor: u32) -> Result<(), ParamError> {
    match hash_size.checked_mul(highfreq_factor) {
        Some(side) if side <= MAX_DCT_SIDE => Ok(()),
        _ => Err(invalid(
            "highfreq_factor",
            highfreq_factor,
            &format!("hash_size * highfreq_factor must not exceed {}", MAX_DCT_SIDE),
        )),
    }
}

fn invalid(key: &str, value: u32, reason: &str) -> ParamError {
    ParamError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
