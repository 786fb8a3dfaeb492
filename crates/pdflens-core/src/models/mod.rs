//! Data models and configuration.

pub mod config;
pub mod document;

pub use config::PdflensConfig;
pub use document::{
    ColorMode, DocumentMetadata, DocumentReport, ExtractedImage, ImageAnalysis, ImageEncoding,
    ImageMetadata, ImageRecord, PageContent, PageGeometry, PixelStats, SourceInfo, StageOutcome,
    Warning, WarningKind, WarningStage,
};
