//! Core library for reading PDFs and analyzing their images.
//!
//! This crate provides:
//! - Source resolution (local paths and downloaded URLs)
//! - PDF processing (per-page text, embedded images, metadata)
//! - Image filtering, OCR and vision model captioning
//! - A per-page extraction pipeline and the reports built from it
//! - A request [`Service`] for the five operations

pub mod analysis;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod range;
pub mod report;
pub mod service;
pub mod source;
pub mod vision;

pub use error::{ErrorKind, PdflensError, Result};
pub use models::{DocumentReport, PdflensConfig, Warning};
pub use pipeline::{ExtractionMode, Pipeline};
pub use range::{PageRange, RangeRequest};
pub use report::{ImagesReport, InfoReport, OcrTextReport, StructureReport, TextReport};
pub use service::{Operation, OperationResult, Request, Response, Service, ServiceBuilder};
pub use source::SourceSpec;
