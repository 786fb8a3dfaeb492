//! Document, page and image models produced by the extraction pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::range::PageRange;

/// Color space of an embedded image as declared by the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Gray,
    Rgb,
    Cmyk,
    Indexed,
    Unknown,
}

/// Encoding of the bytes carried by an [`ExtractedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    Jpeg,
    Png,
}

impl ImageEncoding {
    /// File extension used when persisting images.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
            ImageEncoding::Png => "png",
        }
    }
}

/// An image pulled out of a PDF page.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Encoded image bytes (JPEG passthrough or PNG).
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Declared color space.
    pub color_mode: ColorMode,
    /// Encoding of `data`.
    pub encoding: ImageEncoding,
    /// Page number (1-indexed).
    pub page: u32,
    /// Sequence number within the page (1-indexed).
    pub index: u32,
}

impl ExtractedImage {
    /// Stable file name, `page{N}_img{M}.{ext}`.
    pub fn file_name(&self) -> String {
        format!("page{}_img{}.{}", self.page, self.index, self.encoding.extension())
    }
}

/// Pixel statistics computed from decoded image data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelStats {
    /// Average color, one entry per channel (1 for grayscale, 3 for color).
    pub average_color: Vec<u8>,
    /// Mean channel intensity (0-255).
    pub brightness: f32,
    pub is_bright: bool,
    pub is_dark: bool,
    /// Mean per-channel standard deviation above threshold.
    pub is_colorful: bool,
    /// `red`, `green`, `blue`, `mixed` or `grayscale`.
    pub dominant_hue: String,
}

/// Basic metadata reported for every analyzed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
    pub color_mode: ColorMode,
    pub size_bytes: usize,
    pub aspect_ratio: f32,
    /// High-contrast, mostly dark content: a hint that the image holds text.
    pub likely_has_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<PixelStats>,
}

/// Outcome of one analysis stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage produced a value.
    Ok,
    /// The stage ran but produced nothing.
    Empty,
    /// The stage was not requested.
    Skipped,
    /// The stage failed; the message is also recorded as a warning.
    Failed(String),
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

/// Combined OCR, captioning and metadata result for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// Recognized text; absent if OCR failed or found nothing.
    pub ocr_text: Option<String>,
    /// Vision model caption; absent if disabled or failed.
    pub caption: Option<String>,
    pub metadata: ImageMetadata,
    pub ocr: StageOutcome,
    pub captioning: StageOutcome,
    /// Natural-language summary of everything above.
    pub description: String,
}

impl ImageAnalysis {
    pub fn has_text(&self) -> bool {
        self.ocr_text.is_some()
    }
}

/// What remains of an [`ExtractedImage`] once it has been analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub page_number: u32,
    pub image_index: u32,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
    pub color_mode: ColorMode,
    pub size_bytes: usize,
    /// Where the image was written, if persistence was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ImageAnalysis>,
}

impl ImageRecord {
    pub fn from_image(image: &ExtractedImage) -> Self {
        Self {
            page_number: image.page,
            image_index: image.index,
            filename: image.file_name(),
            width: image.width,
            height: image.height,
            encoding: image.encoding,
            color_mode: image.color_mode,
            size_bytes: image.data.len(),
            path: None,
            analysis: None,
        }
    }

    /// OCR text of this image, if any.
    pub fn ocr_text(&self) -> Option<&str> {
        self.analysis.as_ref().and_then(|a| a.ocr_text.as_deref())
    }
}

/// Page size in points and rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub rotation: i64,
}

/// Content gathered from a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page number (1-indexed).
    pub number: u32,
    /// Native text; empty when the page has none.
    pub text: String,
    /// Images that passed the filter, in page order.
    pub images: Vec<ImageRecord>,
    /// Images found on the page before filtering.
    pub images_found: usize,
    /// Images rejected by the filter.
    pub images_filtered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PageGeometry>,
}

impl PageContent {
    pub fn empty(number: u32) -> Self {
        Self {
            number,
            text: String::new(),
            images: Vec::new(),
            images_found: 0,
            images_filtered: 0,
            geometry: None,
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Document information dictionary entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// Raw `CreationDate` string, e.g. `D:20240101120000Z`.
    pub creation_date: Option<String>,
    /// Raw `ModDate` string.
    pub modification_date: Option<String>,
}

/// Where the PDF came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Local path, when the request named one.
    pub file_path: Option<String>,
    /// Remote URL, when the request named one.
    pub url: Option<String>,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Page,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningStage {
    Text,
    Images,
    Ocr,
    Caption,
    Persist,
}

/// A non-fatal failure recorded during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<u32>,
    pub stage: WarningStage,
    pub message: String,
}

impl Warning {
    pub fn page(page: u32, stage: WarningStage, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Page,
            page,
            image: None,
            stage,
            message: message.into(),
        }
    }

    pub fn image(page: u32, image: u32, stage: WarningStage, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Image,
            page,
            image: Some(image),
            stage,
            message: message.into(),
        }
    }
}

/// Everything the pipeline learned about a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source: SourceInfo,
    pub metadata: DocumentMetadata,
    pub page_count: u32,
    pub is_encrypted: bool,
    pub pdf_version: String,
    /// Effective page range that was processed.
    pub range: PageRange,
    pub pages: Vec<PageContent>,
    pub warnings: Vec<Warning>,
    /// Directory images were written to, if any.
    pub output_dir: Option<PathBuf>,
    /// OCR language used, if OCR ran.
    pub ocr_language: Option<String>,
}

impl DocumentReport {
    /// Total images kept across all processed pages.
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }

    /// Total images found across all processed pages, filtered or not.
    pub fn images_found(&self) -> usize {
        self.pages.iter().map(|p| p.images_found).sum()
    }
}
