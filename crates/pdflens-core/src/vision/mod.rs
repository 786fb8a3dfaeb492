//! Vision model captioning for images.

mod ollama;

pub use ollama::OllamaCaptioner;

use std::sync::Arc;

use crate::error::CaptionError;
use crate::models::config::VisionConfig;

/// Produces a natural-language caption for an encoded image.
pub trait Captioner: Send + Sync {
    /// Get the model name.
    fn model_name(&self) -> &str;

    /// Caption PNG or JPEG bytes.
    fn caption(&self, image: &[u8]) -> Result<String, CaptionError>;
}

/// Captioner used when no vision model is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCaptioner;

impl Captioner for DisabledCaptioner {
    fn model_name(&self) -> &str {
        "none"
    }

    fn caption(&self, _image: &[u8]) -> Result<String, CaptionError> {
        Err(CaptionError::NotConfigured)
    }
}

/// Build the captioner described by `config`; no endpoint means disabled.
pub fn create_captioner(config: &VisionConfig) -> Result<Arc<dyn Captioner>, CaptionError> {
    match &config.endpoint {
        Some(_) => Ok(Arc::new(OllamaCaptioner::new(config)?)),
        None => Ok(Arc::new(DisabledCaptioner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_captioner() {
        let captioner = create_captioner(&VisionConfig::default()).unwrap();
        assert_eq!(captioner.model_name(), "none");
        assert!(matches!(captioner.caption(&[1, 2, 3]), Err(CaptionError::NotConfigured)));
    }

    #[test]
    fn test_configured_captioner() {
        let config = VisionConfig {
            endpoint: Some("http://localhost:11434".to_string()),
            model: "llava:13b".to_string(),
            ..VisionConfig::default()
        };
        let captioner = create_captioner(&config).unwrap();
        assert_eq!(captioner.model_name(), "llava:13b");
    }
}
