//! Captioning through an Ollama-compatible `/api/generate` endpoint.

use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Captioner;
use crate::error::CaptionError;
use crate::models::config::VisionConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Vision captioner backed by a multimodal model served by Ollama.
pub struct OllamaCaptioner {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
    prompt: String,
    max_tokens: u32,
}

impl OllamaCaptioner {
    pub fn new(config: &VisionConfig) -> Result<Self, CaptionError> {
        let endpoint = config.endpoint.as_deref().ok_or(CaptionError::NotConfigured)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CaptionError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/api/generate", endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn request_body(&self, image: &[u8]) -> GenerateRequest<'_> {
        GenerateRequest {
            model: &self.model,
            prompt: &self.prompt,
            images: vec![STANDARD.encode(image)],
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_tokens,
            },
        }
    }
}

impl Captioner for OllamaCaptioner {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn caption(&self, image: &[u8]) -> Result<String, CaptionError> {
        let start = Instant::now();

        let resp = self
            .client
            .post(&self.url)
            .json(&self.request_body(image))
            .send()
            .map_err(|e| CaptionError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(CaptionError::Request(format!("HTTP {}: {}", status, body.trim())));
        }

        let parsed: GenerateResponse = resp
            .json()
            .map_err(|e| CaptionError::Response(e.to_string()))?;

        let caption = parsed.response.trim().to_string();
        if caption.is_empty() {
            return Err(CaptionError::Empty);
        }

        debug!(
            "{} captioned image in {}ms",
            self.model,
            start.elapsed().as_millis()
        );
        Ok(caption)
    }
}
