//! Configuration structures for pdflens.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for pdflens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdflensConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Vision captioning configuration.
    pub vision: VisionConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Remote source download configuration.
    pub download: DownloadConfig,
}

/// Which OCR engine to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    /// Tesseract command-line binary.
    Tesseract,
    /// Bundled ONNX models (requires the `onnx-ocr` feature).
    Onnx,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine backend.
    pub backend: OcrBackendKind,

    /// Default language code when a request does not name one.
    pub language: String,

    /// Tesseract page segmentation mode (6 = uniform block of text).
    pub page_segmentation_mode: u8,

    /// Tesseract executable name or path.
    pub tesseract_cmd: PathBuf,

    /// Maximum image dimension (longer side) handed to the engine.
    pub max_image_size: u32,

    /// Apply adaptive thresholding before recognition.
    pub enhance: bool,

    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Tesseract,
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            tesseract_cmd: PathBuf::from("tesseract"),
            max_image_size: 4096,
            enhance: false,
            model_dir: PathBuf::from("models"),
        }
    }
}

/// Vision captioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Caption images when a request does not say otherwise.
    ///
    /// Captioning costs a model inference per image, usually seconds.
    /// Turn this off for large documents or latency-sensitive callers.
    pub enabled_by_default: bool,

    /// Base URL of an Ollama-compatible server. `None` disables captioning.
    pub endpoint: Option<String>,

    /// Vision model name.
    pub model: String,

    /// Prompt sent along with each image.
    pub prompt: String,

    /// Per-image request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: true,
            endpoint: None,
            model: "llava".to_string(),
            prompt: "Describe this image in one or two sentences.".to_string(),
            timeout_secs: 120,
            max_tokens: 100,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Images narrower than this are treated as decoration.
    pub min_image_width: u32,

    /// Images shorter than this are treated as decoration.
    pub min_image_height: u32,

    /// Maximum images taken from one page (0 = unlimited).
    pub max_images_per_page: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_image_width: 50,
            min_image_height: 50,
            max_images_per_page: 0,
        }
    }
}

/// Remote download configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum number of redirects to follow.
    pub max_redirects: usize,

    /// Maximum accepted body size in bytes.
    pub max_bytes: u64,

    /// User-Agent header.
    pub user_agent: String,

    /// Directory for downloaded files (default: OS temp dir).
    pub temp_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_redirects: 10,
            max_bytes: 200 * 1024 * 1024,
            user_agent: format!("pdflens/{}", env!("CARGO_PKG_VERSION")),
            temp_dir: None,
        }
    }
}

impl PdflensConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PdflensConfig =
            serde_json::from_str(r#"{"ocr": {"language": "fra"}, "vision": {"endpoint": "http://localhost:11434"}}"#)
                .unwrap();
        assert_eq!(config.ocr.language, "fra");
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.vision.endpoint.as_deref(), Some("http://localhost:11434"));
        assert!(config.vision.enabled_by_default);
        assert_eq!(config.pdf.min_image_width, 50);
        assert_eq!(config.download.max_redirects, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PdflensConfig::default();
        config.ocr.backend = OcrBackendKind::Onnx;
        config.pdf.max_images_per_page = 5;
        config.save(&path).unwrap();

        let loaded = PdflensConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.backend, OcrBackendKind::Onnx);
        assert_eq!(loaded.pdf.max_images_per_page, 5);
    }
}
