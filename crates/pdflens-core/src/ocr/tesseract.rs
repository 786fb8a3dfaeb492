//! Tesseract OCR through its command-line binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::{debug, trace};

use super::OcrEngine;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Runs `tesseract <image> stdout -l <lang> --psm <mode>`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
    page_segmentation_mode: u8,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
            page_segmentation_mode: 6,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    /// Use a specific tesseract executable.
    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }

    fn run(&self, image_path: &Path, language: &str) -> Result<String, OcrError> {
        let output = Command::new(&self.command)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", language])
            .args(["--psm", &self.page_segmentation_mode.to_string()])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stderr.contains("Failed loading language") || stderr.contains("couldn't load any languages") {
                    Err(OcrError::UnsupportedLanguage(language.to_string()))
                } else {
                    Err(OcrError::Recognition(format!("tesseract failed: {}", stderr.trim())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::EngineUnavailable(
                format!("{} not found (install tesseract-ocr)", self.command.display()),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &[u8], language: &str) -> Result<String, OcrError> {
        let start = Instant::now();

        let mut file = tempfile::Builder::new()
            .prefix("pdflens-ocr-")
            .suffix(".png")
            .tempfile()?;
        file.write_all(image)?;
        file.flush()?;

        trace!("Running tesseract on {}", file.path().display());
        let text = self.run(file.path(), language)?;

        debug!(
            "tesseract recognized {} chars in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = OcrConfig {
            tesseract_cmd: PathBuf::from("/opt/tesseract/bin/tesseract"),
            page_segmentation_mode: 3,
            ..OcrConfig::default()
        };
        let engine = TesseractEngine::from_config(&config);
        assert_eq!(engine.command, PathBuf::from("/opt/tesseract/bin/tesseract"));
        assert_eq!(engine.page_segmentation_mode, 3);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let engine = TesseractEngine::new().with_command("pdflens-no-such-tesseract-binary");
        let err = engine.recognize(&[0x89, b'P', b'N', b'G'], "eng").unwrap_err();
        assert!(matches!(err, OcrError::EngineUnavailable(_)));
    }
}
