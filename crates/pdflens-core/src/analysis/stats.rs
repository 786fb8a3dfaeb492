//! Pixel statistics over decoded images.

use image::{DynamicImage, GenericImageView};
use ndarray::{Array1, Array2, Axis};

use crate::models::PixelStats;

/// Upper bound on pixels sampled for color statistics.
const MAX_SAMPLES: usize = 10_000;

/// Luma weights (ITU-R 601).
const LUMA: [f32; 3] = [0.2989, 0.5870, 0.1140];

/// Mean and standard deviation of luminance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Luminance {
    pub mean: f32,
    pub std_dev: f32,
}

impl Luminance {
    /// High contrast on a dark-leaning background: how text scans look.
    pub fn looks_like_text(&self) -> bool {
        self.std_dev > 50.0 && self.mean < 128.0
    }
}

/// Compute luminance over every pixel of the image.
pub fn luminance(image: &DynamicImage) -> Luminance {
    let values: Array1<f32> = if is_grayscale(image) {
        image.to_luma8().pixels().map(|p| f32::from(p[0])).collect()
    } else {
        image
            .to_rgb8()
            .pixels()
            .map(|p| LUMA[0] * f32::from(p[0]) + LUMA[1] * f32::from(p[1]) + LUMA[2] * f32::from(p[2]))
            .collect()
    };

    Luminance {
        mean: values.mean().unwrap_or(0.0),
        std_dev: values.std(0.0),
    }
}

/// Average color, brightness, colorfulness and dominant hue.
pub fn pixel_stats(image: &DynamicImage) -> PixelStats {
    if is_grayscale(image) {
        let gray = image.to_luma8();
        let values: Array1<f32> = gray.pixels().map(|p| f32::from(p[0])).collect();
        let brightness = values.mean().unwrap_or(0.0);
        return PixelStats {
            average_color: vec![brightness.round() as u8],
            brightness: round1(brightness),
            is_bright: brightness > 180.0,
            is_dark: brightness < 75.0,
            is_colorful: false,
            dominant_hue: "grayscale".to_string(),
        };
    }

    let samples = sample_rgb(image);
    if samples.nrows() == 0 {
        return PixelStats {
            average_color: vec![0, 0, 0],
            brightness: 0.0,
            is_bright: false,
            is_dark: true,
            is_colorful: false,
            dominant_hue: "mixed".to_string(),
        };
    }

    let channel_mean = samples
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(3));
    let channel_std = samples.std_axis(Axis(0), 0.0);
    let brightness = samples.mean().unwrap_or(0.0);

    PixelStats {
        average_color: channel_mean.iter().map(|c| c.round() as u8).collect(),
        brightness: round1(brightness),
        is_bright: brightness > 180.0,
        is_dark: brightness < 75.0,
        is_colorful: channel_std.mean().unwrap_or(0.0) > 30.0,
        dominant_hue: dominant_hue(&samples).to_string(),
    }
}

fn is_grayscale(image: &DynamicImage) -> bool {
    image.color().channel_count() <= 2
}

/// Evenly strided sample of RGB pixels as an `n x 3` matrix.
fn sample_rgb(image: &DynamicImage) -> Array2<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = image.dimensions();
    let total = width as usize * height as usize;
    let step = total.div_ceil(MAX_SAMPLES).max(1);

    let values: Vec<f32> = rgb
        .pixels()
        .step_by(step)
        .flat_map(|p| p.0.map(f32::from))
        .collect();
    let rows = values.len() / 3;
    Array2::from_shape_vec((rows, 3), values).unwrap_or_else(|_| Array2::zeros((0, 3)))
}

/// The channel that is brightest in more than 40% of pixels, else `mixed`.
fn dominant_hue(samples: &Array2<f32>) -> &'static str {
    let mut counts = [0usize; 3];
    for row in samples.rows() {
        let mut best = 0;
        for c in 1..3 {
            if row[c] > row[best] {
                best = c;
            }
        }
        counts[best] += 1;
    }

    let total = samples.nrows() as f32;
    let share = |c: usize| counts[c] as f32 / total;
    if share(0) > 0.4 {
        "red"
    } else if share(1) > 0.4 {
        "green"
    } else if share(2) > 0.4 {
        "blue"
    } else {
        "mixed"
    }
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_gray_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(60, 60, Luma([200])));
        let stats = pixel_stats(&img);
        assert_eq!(stats.average_color, vec![200]);
        assert_eq!(stats.dominant_hue, "grayscale");
        assert!(stats.is_bright);
        assert!(!stats.is_colorful);

        let lum = luminance(&img);
        assert_eq!(lum.mean, 200.0);
        assert_eq!(lum.std_dev, 0.0);
        assert!(!lum.looks_like_text());
    }

    #[test]
    fn test_red_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, Rgb([200, 10, 5])));
        let stats = pixel_stats(&img);
        assert_eq!(stats.average_color, vec![200, 10, 5]);
        assert_eq!(stats.dominant_hue, "red");
        assert!(stats.is_dark);
        assert!(!stats.is_colorful);
    }

    #[test]
    fn test_colorful_stripes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(90, 90, |x, _| match x % 3 {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        }));
        let stats = pixel_stats(&img);
        assert!(stats.is_colorful);
        assert_eq!(stats.dominant_hue, "mixed");
    }

    #[test]
    fn test_text_like_luminance() {
        // Mostly black with white strokes: dark mean, high spread.
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(100, 100, |x, _| {
            if x % 4 == 0 { Luma([255]) } else { Luma([0]) }
        }));
        let lum = luminance(&img);
        assert!(lum.mean < 128.0);
        assert!(lum.std_dev > 50.0);
        assert!(lum.looks_like_text());
    }

    #[test]
    fn test_sampling_caps_rows() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 400, Rgb([1, 2, 3])));
        let samples = sample_rgb(&img);
        assert!(samples.nrows() <= MAX_SAMPLES);
        assert_eq!(samples.ncols(), 3);
    }
}
