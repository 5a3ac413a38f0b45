//! SIMD-accelerated grayscale resizing.
//!
//! Every in-crate algorithm starts by shrinking the image to a small
//! grayscale grid. fast_image_resize does this with AVX2/NEON when the
//! CPU has it.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Reusable resizer
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    /// Create a new fast resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Convert to grayscale and resize to `width` x `height` with a
    /// Lanczos3 filter.
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        let gray = image.to_luma8();

        let src_width = gray.width();
        let src_height = gray.height();

        if src_width == 0 || src_height == 0 {
            return Err(HashError::Computation(
                "image has no pixels".to_string(),
            ));
        }

        if width == 0 || height == 0 {
            return Err(HashError::Computation(format!(
                "invalid resize target {}x{}",
                width, height
            )));
        }

        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| HashError::Computation(format!("failed to create source image: {}", e)))?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| HashError::Computation(format!("resize failed: {}", e)))?;

        let result_buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
                HashError::Computation("failed to create result buffer".to_string())
            })?;

        Ok(result_buffer)
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off resizing
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    let mut resizer = FastResizer::new();
    resizer.resize_to_grayscale(image, width, height)
}

/// Row-major matrix of pixel intensities, scaled by `scale`
pub fn to_matrix(gray: &GrayImage, scale: f64) -> Vec<Vec<f64>> {
    (0..gray.height())
        .map(|y| {
            (0..gray.width())
                .map(|x| gray.get_pixel(x, y)[0] as f64 * scale)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) * 128 / (width + height).max(1)) as u8;
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn resize_produces_correct_dimensions() {
        let image = create_test_image(100, 100);
        let resized = resize_to_grayscale(&image, 8, 8).unwrap();

        assert_eq!(resized.width(), 8);
        assert_eq!(resized.height(), 8);
    }

    #[test]
    fn resize_non_square_image() {
        let image = create_test_image(200, 100);
        let resized = resize_to_grayscale(&image, 9, 8).unwrap();

        assert_eq!(resized.width(), 9);
        assert_eq!(resized.height(), 8);
    }

    #[test]
    fn upscaling_is_allowed() {
        let image = create_test_image(4, 4);
        let resized = resize_to_grayscale(&image, 32, 32).unwrap();

        assert_eq!(resized.width(), 32);
    }

    #[test]
    fn zero_target_is_rejected() {
        let image = create_test_image(10, 10);
        assert!(resize_to_grayscale(&image, 0, 8).is_err());
    }

    #[test]
    fn matrix_scales_values() {
        let gray: GrayImage = ImageBuffer::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        let matrix = to_matrix(&gray, 1.0 / 255.0);

        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0], vec![0.0, 1.0]);
    }
}
