//! Natural-language image descriptions.

use crate::models::{ImageMetadata, StageOutcome};

/// OCR text longer than this is cut in descriptions.
const OCR_PREVIEW_CHARS: usize = 200;

/// Compose a description from metadata, OCR text and the captioning outcome.
pub fn describe(
    metadata: &ImageMetadata,
    ocr_text: Option<&str>,
    caption: Option<&str>,
    captioning: &StageOutcome,
) -> String {
    let mut parts = Vec::new();

    let orientation = if metadata.aspect_ratio > 2.0 {
        "wide, panoramic"
    } else if metadata.aspect_ratio < 0.6 {
        "tall, portrait-oriented"
    } else {
        "standard"
    };
    parts.push(format!(
        "This is a {} image ({}x{} pixels)",
        orientation, metadata.width, metadata.height
    ));

    if let Some(stats) = &metadata.stats {
        match stats.dominant_hue.as_str() {
            "grayscale" => parts.push("The image is grayscale".to_string()),
            "mixed" => {}
            hue => parts.push(format!("The image has a {}-dominant color palette", hue)),
        }

        parts.push(if stats.is_colorful {
            "The image is colorful with varied hues".to_string()
        } else {
            "The image has a more monochromatic or muted color scheme".to_string()
        });

        parts.push(if stats.is_bright {
            "The image is bright and well-lit".to_string()
        } else if stats.is_dark {
            "The image is dark or dimly lit".to_string()
        } else {
            format!("The image has moderate brightness (average: {:.0}/255)", stats.brightness)
        });
    }

    parts.push(if metadata.likely_has_text {
        "The image appears to contain primarily text content".to_string()
    } else {
        "The image appears to be a visual/graphical element rather than text-based".to_string()
    });

    if let Some(text) = ocr_text {
        parts.push(format!("The image contains the following text: \"{}\"", preview(text)));
    }

    match (caption, captioning) {
        (Some(caption), _) => parts.push(format!("Content description: {}", caption)),
        (None, StageOutcome::Failed(_)) => {
            parts.push("(Vision model analysis was requested but unavailable)".to_string())
        }
        _ => {}
    }

    format!("{}.", parts.join(". "))
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(OCR_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorMode, ImageEncoding, PixelStats};
    use pretty_assertions::assert_eq;

    fn metadata(width: u32, height: u32, likely_has_text: bool) -> ImageMetadata {
        ImageMetadata {
            width,
            height,
            encoding: ImageEncoding::Png,
            color_mode: ColorMode::Rgb,
            size_bytes: 1024,
            aspect_ratio: width as f32 / height as f32,
            likely_has_text,
            stats: Some(PixelStats {
                average_color: vec![120, 120, 120],
                brightness: 120.4,
                is_bright: false,
                is_dark: false,
                is_colorful: false,
                dominant_hue: "blue".to_string(),
            }),
        }
    }

    #[test]
    fn test_full_description() {
        let text = describe(
            &metadata(600, 200, true),
            Some("Quarterly revenue"),
            Some("A bar chart"),
            &StageOutcome::Ok,
        );
        assert_eq!(
            text,
            "This is a wide, panoramic image (600x200 pixels). \
             The image has a blue-dominant color palette. \
             The image has a more monochromatic or muted color scheme. \
             The image has moderate brightness (average: 120/255). \
             The image appears to contain primarily text content. \
             The image contains the following text: \"Quarterly revenue\". \
             Content description: A bar chart."
        );
    }

    #[test]
    fn test_caption_failure_is_mentioned() {
        let text = describe(
            &metadata(100, 300, false),
            None,
            None,
            &StageOutcome::Failed("timeout".to_string()),
        );
        assert!(text.starts_with("This is a tall, portrait-oriented image (100x300 pixels)."));
        assert!(text.ends_with("(Vision model analysis was requested but unavailable)."));
        assert!(!text.contains("following text"));
    }

    #[test]
    fn test_skipped_caption_is_silent() {
        let text = describe(&metadata(100, 100, false), None, None, &StageOutcome::Skipped);
        assert!(!text.contains("Vision model"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "\u{e9}".repeat(250);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
