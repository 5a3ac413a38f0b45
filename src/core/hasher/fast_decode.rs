//! Image decoding with a JPEG fast path.
//!
//! JPEG data is decoded with zune-jpeg (1.5-2x faster than the image
//! crate); everything else, and any JPEG zune-jpeg rejects, goes through
//! the image crate. The format is sniffed from the content, not the file
//! name.

use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb, Rgba};
use std::path::PathBuf;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Image decoder that picks the fastest available backend per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode encoded image bytes.
    ///
    /// Errors carry an empty path; callers that know the source file
    /// attach it with [`HashError::with_path`].
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, HashError> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => {
                Self::decode_jpeg(bytes).or_else(|_| Self::decode_fallback(bytes))
            }
            _ => Self::decode_fallback(bytes),
        }
    }

    fn decode_jpeg(bytes: &[u8]) -> Result<DynamicImage, HashError> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder
            .decode()
            .map_err(|e| decode_error(format!("zune-jpeg decode failed: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| decode_error("failed to get image info".to_string()))?;

        let width = info.width as u32;
        let height = info.height as u32;

        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

        let image = match out_colorspace {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| decode_error("failed to create RGB buffer".to_string()))?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| decode_error("failed to create RGBA buffer".to_string()))?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| decode_error("failed to create Luma buffer".to_string()))?;
                DynamicImage::ImageLuma8(buffer)
            }
            _ => return Self::decode_fallback(bytes),
        };

        Ok(image)
    }

    fn decode_fallback(bytes: &[u8]) -> Result<DynamicImage, HashError> {
        image::load_from_memory(bytes).map_err(|e| decode_error(e.to_string()))
    }
}

fn decode_error(reason: String) -> HashError {
    HashError::Decode {
        path: PathBuf::new(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn create_test_image() -> DynamicImage {
        let img = ImageBuffer::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 90]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn decodes_png() {
        let bytes = encode(&create_test_image(), ImageFormat::Png);
        let decoded = FastDecoder::decode(&bytes).unwrap();

        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn decodes_jpeg() {
        let bytes = encode(&create_test_image(), ImageFormat::Jpeg);
        let decoded = FastDecoder::decode(&bytes).unwrap();

        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let result = FastDecoder::decode(b"this is not a valid image file");
        assert!(matches!(result, Err(HashError::Decode { .. })));
    }

    #[test]
    fn rejects_truncated_png() {
        let bytes = encode(&create_test_image(), ImageFormat::Png);
        let result = FastDecoder::decode(&bytes[..bytes.len() / 2]);
        assert!(result.is_err());
    }
}
