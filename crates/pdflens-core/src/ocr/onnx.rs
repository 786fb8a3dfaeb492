//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, info};

use super::OcrEngine;
use crate::error::OcrError;

/// Tesseract-style codes for the scripts the Latin recognition model covers.
const LATIN_LANGUAGES: &[&str] = &[
    "eng", "fra", "deu", "spa", "ita", "por", "nld", "pol", "ces", "slk", "slv", "hrv", "ron",
    "hun", "fin", "swe", "nor", "dan", "isl", "est", "lav", "lit", "tur", "cat", "glg", "eus",
    "gle", "cym", "lat", "ind", "msa", "vie", "afr", "sqi", "mlt",
];

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// Only the Latin recognition model is loaded, so any other script is
/// rejected with [`OcrError::UnsupportedLanguage`].
pub struct OnnxOcrEngine {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
}

impl OnnxOcrEngine {
    /// Create an engine from `det.onnx`, `latin_rec.onnx` and `latin_dict.txt` in a directory.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::EngineUnavailable(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

fn check_language(language: &str) -> Result<(), OcrError> {
    match language.split('+').find(|code| !LATIN_LANGUAGES.contains(code)) {
        Some(code) => Err(OcrError::UnsupportedLanguage(code.to_string())),
        None => Ok(()),
    }
}

impl OcrEngine for OnnxOcrEngine {
    fn name(&self) -> &str {
        "onnx"
    }

    fn recognize(&self, image: &[u8], language: &str) -> Result<String, OcrError> {
        check_language(language)?;

        let start = Instant::now();
        let image = image::load_from_memory(image).map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let engine = self
            .engine
            .lock()
            .map_err(|_| OcrError::EngineUnavailable("engine lock poisoned".to_string()))?;
        let results = engine
            .run_from_image(&image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        // Reading order: rows of roughly 20px, then left to right.
        let mut lines: Vec<((i64, f64), String)> = results
            .iter()
            .map(|r| {
                let (x, y) = r
                    .bounding_box
                    .exterior()
                    .coords()
                    .next()
                    .map(|c| (c.x, c.y))
                    .unwrap_or_default();
                (((y / 20.0) as i64, x), r.text.replace("[UNK]", " "))
            })
            .collect();
        lines.sort_by(|(a, _), (b, _)| {
            a.0.cmp(&b.0)
                .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        });

        debug!(
            "pure-onnx-ocr returned {} text regions in {}ms",
            lines.len(),
            start.elapsed().as_millis()
        );

        Ok(lines.into_iter().map(|(_, text)| text).collect::<Vec<_>>().join("\n"))
    }
}
