//! Per-image OCR and captioning.

use std::sync::Arc;

use tracing::debug;

use super::describe::describe;
use super::filter::likely_has_text;
use super::stats::pixel_stats;
use crate::models::{ExtractedImage, ImageAnalysis, ImageMetadata, StageOutcome};
use crate::ocr::{ImagePreprocessor, OcrEngine};
use crate::vision::Captioner;

/// Runs OCR and optional captioning over one image.
///
/// A failing stage is recorded in the result and never stops the other stage.
#[derive(Clone)]
pub struct ImageAnalyzer {
    ocr: Arc<dyn OcrEngine>,
    captioner: Arc<dyn Captioner>,
    preprocessor: ImagePreprocessor,
}

impl ImageAnalyzer {
    pub fn new(ocr: Arc<dyn OcrEngine>, captioner: Arc<dyn Captioner>) -> Self {
        Self {
            ocr,
            captioner,
            preprocessor: ImagePreprocessor::default(),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Analyze an image: metadata, OCR, then captioning if `use_vision`.
    pub fn analyze(&self, image: &ExtractedImage, ocr_language: &str, use_vision: bool) -> ImageAnalysis {
        let metadata = self.metadata(image);

        let (ocr_text, ocr) = self.run_ocr(image, ocr_language);
        let (caption, captioning) = if use_vision {
            self.run_caption(image)
        } else {
            (None, StageOutcome::Skipped)
        };

        let description = describe(&metadata, ocr_text.as_deref(), caption.as_deref(), &captioning);
        debug!(
            "Analyzed image {} on page {}: ocr={:?} caption={:?}",
            image.index, image.page, ocr, captioning
        );

        ImageAnalysis {
            ocr_text,
            caption,
            metadata,
            ocr,
            captioning,
            description,
        }
    }

    fn metadata(&self, image: &ExtractedImage) -> ImageMetadata {
        let decoded = image::load_from_memory(&image.data).ok();
        let aspect_ratio = if image.height > 0 {
            ((image.width as f32 / image.height as f32) * 100.0).round() / 100.0
        } else {
            0.0
        };

        ImageMetadata {
            width: image.width,
            height: image.height,
            encoding: image.encoding,
            color_mode: image.color_mode,
            size_bytes: image.data.len(),
            aspect_ratio,
            likely_has_text: decoded.as_ref().is_some_and(likely_has_text),
            stats: decoded.as_ref().map(pixel_stats),
        }
    }

    fn run_ocr(&self, image: &ExtractedImage, language: &str) -> (Option<String>, StageOutcome) {
        let result = self
            .preprocessor
            .prepare_png(&image.data)
            .and_then(|png| self.ocr.recognize(&png, language));

        match result {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    (None, StageOutcome::Empty)
                } else {
                    (Some(text.to_string()), StageOutcome::Ok)
                }
            }
            Err(e) => (None, StageOutcome::Failed(e.to_string())),
        }
    }

    fn run_caption(&self, image: &ExtractedImage) -> (Option<String>, StageOutcome) {
        match self.captioner.caption(&image.data) {
            Ok(caption) => {
                let caption = caption.trim();
                if caption.is_empty() {
                    (None, StageOutcome::Empty)
                } else {
                    (Some(caption.to_string()), StageOutcome::Ok)
                }
            }
            Err(e) => (None, StageOutcome::Failed(e.to_string())),
        }
    }
}
