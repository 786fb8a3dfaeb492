//! Request handling for the five operations.
//!
//! [`Service`] validates a [`Request`], runs the pipeline in the matching
//! mode, projects the report and wraps it in a [`Response`] envelope.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::analysis::{ImageAnalyzer, ImageFilter};
use crate::error::{ErrorKind, PdflensError, Result};
use crate::models::{PdflensConfig, Warning};
use crate::ocr::{self, ImagePreprocessor, OcrEngine};
use crate::pdf::{DocumentOpener, LopdfOpener};
use crate::pipeline::{ExtractionMode, Pipeline};
use crate::range::RangeRequest;
use crate::report::{ImagesReport, InfoReport, OcrTextReport, StructureReport, TextReport};
use crate::source::{Fetcher, HttpFetcher, SourceResolver, SourceSpec};
use crate::vision::{self, Captioner};

lazy_static! {
    static ref OCR_LANGUAGE: Regex = Regex::new(r"^[A-Za-z_]+(\+[A-Za-z_]+)*$").unwrap();
}

/// The five operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    ReadText,
    ExtractImages,
    ReadWithOcr,
    GetInfo,
    AnalyzeStructure,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ReadText => "read-text",
            Operation::ExtractImages => "extract-images",
            Operation::ReadWithOcr => "read-with-ocr",
            Operation::GetInfo => "get-info",
            Operation::AnalyzeStructure => "analyze-structure",
        };
        f.write_str(name)
    }
}

/// One request. Parameters an operation does not use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub operation: Operation,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub page_range: Option<RangeRequest>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub analyze_images: Option<bool>,
    #[serde(default)]
    pub use_vision_model: Option<bool>,
    #[serde(default)]
    pub ocr_language: Option<String>,
}

impl Request {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            file_path: None,
            url: None,
            page_range: None,
            output_dir: None,
            analyze_images: None,
            use_vision_model: None,
            ocr_language: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_page_range(mut self, range: RangeRequest) -> Self {
        self.page_range = Some(range);
        self
    }

    fn source(&self) -> Result<SourceSpec> {
        SourceSpec::from_parts(self.file_path.as_deref(), self.url.as_deref())
    }
}

/// Typed result of a successful operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Text(TextReport),
    Images(ImagesReport),
    OcrText(OcrTextReport),
    Info(InfoReport),
    Structure(StructureReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success {
        success: bool,
        operation: Operation,
        result: OperationResult,
        warnings: Vec<Warning>,
    },
    Failure {
        success: bool,
        /// Absent when the request could not be parsed at all.
        operation: Option<Operation>,
        error: ErrorBody,
        file_path: Option<String>,
        url: Option<String>,
    },
}

impl Response {
    pub fn success(operation: Operation, result: OperationResult, warnings: Vec<Warning>) -> Self {
        Response::Success {
            success: true,
            operation,
            result,
            warnings,
        }
    }

    pub fn failure(request: Option<&Request>, err: &PdflensError) -> Self {
        Response::Failure {
            success: false,
            operation: request.map(|r| r.operation),
            error: ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
            },
            file_path: request.and_then(|r| r.file_path.clone()),
            url: request.and_then(|r| r.url.clone()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

/// Wires collaborators together and serves requests.
pub struct Service {
    config: PdflensConfig,
    pipeline: Pipeline,
}

impl Service {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::default()
    }

    pub fn config(&self) -> &PdflensConfig {
        &self.config
    }

    /// Handle a request, folding any failure into the envelope.
    pub fn handle(&self, request: &Request) -> Response {
        match self.execute(request) {
            Ok((result, warnings)) => Response::success(request.operation, result, warnings),
            Err(e) => {
                error!("{} failed: {}", request.operation, e);
                Response::failure(Some(request), &e)
            }
        }
    }

    /// Parse a JSON request and handle it.
    pub fn handle_json(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                let err = PdflensError::InvalidArgument(format!("malformed request: {}", e));
                Response::failure(None, &err)
            }
        }
    }

    /// Run a request and return the typed result plus warnings.
    pub fn execute(&self, request: &Request) -> Result<(OperationResult, Vec<Warning>)> {
        let source = request.source()?;
        let ocr_language = self.ocr_language(request)?;
        info!("Handling {} for {:?}", request.operation, source);

        let (mode, range) = match request.operation {
            Operation::ReadText => (ExtractionMode::TextOnly, request.page_range),
            Operation::ExtractImages => (
                ExtractionMode::Full {
                    analyze: request.analyze_images.unwrap_or(true),
                    use_vision: request
                        .use_vision_model
                        .unwrap_or(self.config.vision.enabled_by_default),
                    ocr_language,
                    output_dir: request.output_dir.clone(),
                },
                request.page_range,
            ),
            Operation::ReadWithOcr => (ExtractionMode::OcrOnly { ocr_language }, request.page_range),
            Operation::GetInfo | Operation::AnalyzeStructure => (ExtractionMode::Census, None),
        };

        let report = self.pipeline.run(&source, range, &mode)?;
        let result = match request.operation {
            Operation::ReadText => OperationResult::Text(TextReport::assemble(&report)),
            Operation::ExtractImages => OperationResult::Images(ImagesReport::assemble(&report)),
            Operation::ReadWithOcr => OperationResult::OcrText(OcrTextReport::assemble(&report)),
            Operation::GetInfo => OperationResult::Info(InfoReport::assemble(&report)),
            Operation::AnalyzeStructure => {
                OperationResult::Structure(StructureReport::assemble(&report))
            }
        };

        Ok((result, report.warnings))
    }

    fn ocr_language(&self, request: &Request) -> Result<String> {
        let language = request
            .ocr_language
            .clone()
            .unwrap_or_else(|| self.config.ocr.language.clone());
        if OCR_LANGUAGE.is_match(&language) {
            Ok(language)
        } else {
            Err(PdflensError::InvalidArgument(format!(
                "invalid ocr_language {:?}: expected codes like eng or eng+fra",
                language
            )))
        }
    }
}

/// Builder for [`Service`]. Any collaborator left unset is built from the config.
#[derive(Default)]
pub struct ServiceBuilder {
    config: PdflensConfig,
    opener: Option<Arc<dyn DocumentOpener>>,
    ocr: Option<Arc<dyn OcrEngine>>,
    captioner: Option<Arc<dyn Captioner>>,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl ServiceBuilder {
    pub fn with_config(mut self, config: PdflensConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn DocumentOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_captioner(mut self, captioner: Arc<dyn Captioner>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the service. Creates HTTP clients, so call it off any async runtime.
    pub fn build(self) -> Result<Service> {
        let config = self.config;

        let opener = self.opener.unwrap_or_else(|| Arc::new(LopdfOpener::new()));
        let ocr = match self.ocr {
            Some(ocr) => ocr,
            None => ocr::create_engine(&config.ocr)
                .map_err(|e| PdflensError::Config(e.to_string()))?,
        };
        let captioner = match self.captioner {
            Some(captioner) => captioner,
            None => vision::create_captioner(&config.vision)
                .map_err(|e| PdflensError::Config(e.to_string()))?,
        };
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&config.download)?),
        };

        let preprocessor = ImagePreprocessor::new()
            .with_max_size(config.ocr.max_image_size)
            .with_enhance(config.ocr.enhance);
        let analyzer = ImageAnalyzer::new(ocr, captioner).with_preprocessor(preprocessor);
        let resolver = SourceResolver::new(fetcher).with_temp_dir(config.download.temp_dir.clone());

        let pipeline = Pipeline::new(resolver, opener, ImageFilter::from_config(&config.pdf), analyzer)
            .with_max_images_per_page(config.pdf.max_images_per_page);

        Ok(Service { config, pipeline })
    }
}
