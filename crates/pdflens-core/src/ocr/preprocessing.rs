//! Image preprocessing for OCR.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

use crate::error::OcrError;

/// Normalizes image bytes before they reach an OCR engine.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Maximum image dimension.
    max_size: u32,
    /// Apply adaptive thresholding.
    enhance: bool,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            max_size: 4096,
            enhance: false,
        }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Binarize images before recognition.
    pub fn with_enhance(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }

    /// Decode, downscale and optionally binarize an encoded image.
    pub fn prepare(&self, data: &[u8]) -> Result<DynamicImage, OcrError> {
        let image = image::load_from_memory(data)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        let (width, height) = image.dimensions();

        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);
        let image = if (new_width, new_height) != (width, height) {
            debug!("Downscaling {}x{} to {}x{} for OCR", width, height, new_width, new_height);
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            image
        };

        Ok(if self.enhance { self.enhance(&image) } else { image })
    }

    /// [`prepare`](Self::prepare), re-encoded as PNG.
    pub fn prepare_png(&self, data: &[u8]) -> Result<Vec<u8>, OcrError> {
        let image = self.prepare(data)?;
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(format!("PNG encoding failed: {}", e)))?;
        Ok(png)
    }

    /// Apply basic image enhancement for better OCR.
    pub fn enhance(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(adaptive_threshold(&gray, 15, 5))
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Local-mean thresholding over a `block_size` window, using an integral image.
fn adaptive_threshold(image: &GrayImage, block_size: u32, c: i64) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    // integral[(y + 1) * (w + 1) + (x + 1)] = sum of pixels in [0..=x, 0..=y]
    let mut integral = vec![0u64; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(image.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * (w + 1) + x + 1] = integral[y * (w + 1) + x + 1] + row_sum;
        }
    }

    let half = (block_size / 2) as usize;
    let mut result = GrayImage::new(width, height);
    for y in 0..h {
        let (y0, y1) = (y.saturating_sub(half), (y + half + 1).min(h));
        for x in 0..w {
            let (x0, x1) = (x.saturating_sub(half), (x + half + 1).min(w));
            let sum = integral[y1 * (w + 1) + x1] + integral[y0 * (w + 1) + x0]
                - integral[y0 * (w + 1) + x1]
                - integral[y1 * (w + 1) + x0];
            let count = ((y1 - y0) * (x1 - x0)) as u64;
            let threshold = (sum / count) as i64 - c;

            let value = i64::from(image.get_pixel(x as u32, y as u32)[0]);
            let output = if value > threshold { 255 } else { 0 };
            result.put_pixel(x as u32, y as u32, Luma([output]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 0, 0]));
        let mut data = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        data
    }

    #[test]
    fn test_resize_dimensions() {
        let preprocessor = ImagePreprocessor::new().with_max_size(960);

        // Image smaller than target
        let (w, h) = preprocessor.calculate_resize_dimensions(500, 300);
        assert_eq!((w, h), (500, 300));

        // Image larger than target
        let (w, h) = preprocessor.calculate_resize_dimensions(1920, 1080);
        assert_eq!(w, 960);
        assert_eq!(h, 540);
    }

    #[test]
    fn test_prepare_downscales() {
        let preprocessor = ImagePreprocessor::new().with_max_size(100);
        let image = preprocessor.prepare(&png(400, 200)).unwrap();
        assert_eq!(image.dimensions(), (100, 50));
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        let err = ImagePreprocessor::new().prepare(b"not an image").unwrap_err();
        assert!(matches!(err, OcrError::InvalidImage(_)));
    }

    #[test]
    fn test_enhance_is_binary() {
        let preprocessor = ImagePreprocessor::new().with_enhance(true);
        let data = preprocessor.prepare_png(&png(64, 64)).unwrap();
        let gray = image::load_from_memory(&data).unwrap().to_luma8();
        assert!(gray.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_adaptive_threshold_flat_image() {
        let flat = GrayImage::from_pixel(20, 20, Luma([128]));
        let out = adaptive_threshold(&flat, 15, 5);
        // Every pixel is above its local mean minus the offset.
        assert!(out.pixels().all(|p| p[0] == 255));
    }
}
