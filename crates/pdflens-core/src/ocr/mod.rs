//! OCR engines.

#[cfg(feature = "onnx-ocr")]
mod onnx;
mod preprocessing;
mod tesseract;

#[cfg(feature = "onnx-ocr")]
pub use onnx::OnnxOcrEngine;
pub use preprocessing::ImagePreprocessor;
pub use tesseract::TesseractEngine;

use std::sync::Arc;

use crate::error::OcrError;
use crate::models::config::{OcrBackendKind, OcrConfig};

/// Recognizes text in an encoded image.
pub trait OcrEngine: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Recognize text in `image` (PNG or JPEG bytes).
    ///
    /// `language` is a Tesseract-style code such as `eng` or `eng+fra`.
    /// The returned text is untrimmed.
    fn recognize(&self, image: &[u8], language: &str) -> Result<String, OcrError>;
}

/// Build the engine selected by `config.backend`.
pub fn create_engine(config: &OcrConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
    match config.backend {
        OcrBackendKind::Tesseract => Ok(Arc::new(TesseractEngine::from_config(config))),
        #[cfg(feature = "onnx-ocr")]
        OcrBackendKind::Onnx => Ok(Arc::new(OnnxOcrEngine::from_dir(&config.model_dir)?)),
        #[cfg(not(feature = "onnx-ocr"))]
        OcrBackendKind::Onnx => Err(OcrError::EngineUnavailable(
            "pdflens was built without the onnx-ocr feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_default_engine() {
        let engine = create_engine(&OcrConfig::default()).unwrap();
        assert_eq!(engine.name(), "tesseract");
    }

    #[cfg(not(feature = "onnx-ocr"))]
    #[test]
    fn test_onnx_requires_feature() {
        let config = OcrConfig {
            backend: OcrBackendKind::Onnx,
            ..OcrConfig::default()
        };
        assert!(matches!(create_engine(&config), Err(OcrError::EngineUnavailable(_))));
    }
}
