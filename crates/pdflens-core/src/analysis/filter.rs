//! Image size gate and the text heuristic.

use image::DynamicImage;
use tracing::trace;

use super::stats::luminance;
use crate::models::ExtractedImage;
use crate::models::config::PdfConfig;

/// Drops images too small to be content (icons, rules, bullets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFilter {
    min_width: u32,
    min_height: u32,
}

impl ImageFilter {
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width,
            min_height,
        }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new(config.min_image_width, config.min_image_height)
    }

    /// Whether the image is big enough to analyze.
    pub fn keep(&self, image: &ExtractedImage) -> bool {
        let keep = image.width >= self.min_width && image.height >= self.min_height;
        if !keep {
            trace!(
                "Filtered image {} on page {}: {}x{}",
                image.index, image.page, image.width, image.height
            );
        }
        keep
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new(50, 50)
    }
}

/// Whether a decoded image looks like a scan of text.
///
/// A hint only; it never gates analysis.
pub fn likely_has_text(image: &DynamicImage) -> bool {
    luminance(image).looks_like_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorMode, ImageEncoding};
    use image::{GrayImage, Luma};

    fn image(width: u32, height: u32) -> ExtractedImage {
        ExtractedImage {
            data: Vec::new(),
            width,
            height,
            color_mode: ColorMode::Gray,
            encoding: ImageEncoding::Png,
            page: 1,
            index: 1,
        }
    }

    #[test]
    fn test_keep_threshold() {
        let filter = ImageFilter::default();
        assert!(!filter.keep(&image(20, 20)));
        assert!(!filter.keep(&image(49, 500)));
        assert!(!filter.keep(&image(500, 49)));
        assert!(filter.keep(&image(50, 50)));
        assert!(filter.keep(&image(200, 200)));
    }

    #[test]
    fn test_custom_threshold() {
        let filter = ImageFilter::from_config(&PdfConfig {
            min_image_width: 100,
            min_image_height: 10,
            ..PdfConfig::default()
        });
        assert!(!filter.keep(&image(99, 400)));
        assert!(filter.keep(&image(100, 10)));
    }

    #[test]
    fn test_likely_has_text() {
        let striped = GrayImage::from_fn(80, 80, |x, _| if x % 4 == 0 { Luma([255]) } else { Luma([0]) });
        assert!(likely_has_text(&DynamicImage::ImageLuma8(striped)));

        let blank = GrayImage::from_pixel(80, 80, Luma([255]));
        assert!(!likely_has_text(&DynamicImage::ImageLuma8(blank)));
    }
}
