//! Result shapes for the five operations.
//!
//! Every assembler is a pure projection of a finished [`DocumentReport`], so
//! assembling twice yields the same value.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DocumentReport, ImageRecord, PageContent};
use crate::pdf::parse_pdf_date;

/// How the document was addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub file_path: Option<String>,
    pub url: Option<String>,
}

impl SourceRef {
    fn of(report: &DocumentReport) -> Self {
        Self {
            file_path: report.source.file_path.clone(),
            url: report.source.url.clone(),
        }
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Join non-empty texts with newlines.
fn join_texts<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    texts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of non-empty paragraphs separated by blank lines.
pub fn text_blocks(text: &str) -> usize {
    let mut blocks = 0;
    let mut in_block = false;
    for line in text.lines() {
        let blank = line.trim().is_empty();
        if !blank && !in_block {
            blocks += 1;
        }
        in_block = !blank;
    }
    blocks
}

// read-text

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextReport {
    #[serde(flatten)]
    pub source: SourceRef,
    pub pages_processed: String,
    pub total_pages: u32,
    pub pages_text: Vec<PageText>,
    pub combined_text: String,
    pub total_word_count: usize,
    pub total_character_count: usize,
}

impl TextReport {
    pub fn assemble(report: &DocumentReport) -> Self {
        let pages_text: Vec<PageText> = report
            .pages
            .iter()
            .map(|page| PageText {
                page_number: page.number,
                text: page.text.clone(),
                word_count: word_count(&page.text),
            })
            .collect();
        let combined_text = join_texts(report.pages.iter().map(|p| p.text.as_str()));

        Self {
            source: SourceRef::of(report),
            pages_processed: report.range.to_string(),
            total_pages: report.page_count,
            total_word_count: word_count(&combined_text),
            total_character_count: combined_text.chars().count(),
            combined_text,
            pages_text,
        }
    }
}

// extract-images

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesSummary {
    pub total_images: usize,
    pub images_with_text: usize,
    pub images_analyzed: usize,
    /// Images dropped by the size filter.
    pub images_filtered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesReport {
    #[serde(flatten)]
    pub source: SourceRef,
    pub output_directory: Option<PathBuf>,
    pub pages_processed: String,
    pub images_extracted: usize,
    pub images: Vec<ImageRecord>,
    pub summary: ImagesSummary,
}

impl ImagesReport {
    pub fn assemble(report: &DocumentReport) -> Self {
        let images: Vec<ImageRecord> = report
            .pages
            .iter()
            .flat_map(|p| p.images.iter().cloned())
            .collect();

        let summary = ImagesSummary {
            total_images: images.len(),
            images_with_text: images.iter().filter(|i| i.ocr_text().is_some()).count(),
            images_analyzed: images.iter().filter(|i| i.analysis.is_some()).count(),
            images_filtered: report.pages.iter().map(|p| p.images_filtered).sum(),
        };

        Self {
            source: SourceRef::of(report),
            output_directory: report.output_dir.clone(),
            pages_processed: report.range.to_string(),
            images_extracted: images.len(),
            images,
            summary,
        }
    }
}

// read-with-ocr

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

impl Confidence {
    /// More than 10 characters of recognized text counts as high confidence.
    fn of(text: &str) -> Self {
        if text.chars().count() > 10 {
            Confidence::High
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageText {
    pub image_index: u32,
    pub ocr_text: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub page_number: u32,
    pub text: String,
    pub ocr_text: String,
    pub images_with_text: Vec<ImageText>,
    /// Native text followed by the page's OCR text.
    pub combined_text: String,
    pub text_word_count: usize,
    pub ocr_word_count: usize,
}

impl OcrPage {
    fn from_page(page: &PageContent) -> Self {
        let images_with_text: Vec<ImageText> = page
            .images
            .iter()
            .filter_map(|image| {
                image.ocr_text().map(|text| ImageText {
                    image_index: image.image_index,
                    ocr_text: text.to_string(),
                    confidence: Confidence::of(text),
                })
            })
            .collect();
        let ocr_text = join_texts(images_with_text.iter().map(|i| i.ocr_text.as_str()));
        let combined_text = join_texts([page.text.as_str(), ocr_text.as_str()].into_iter());

        Self {
            page_number: page.number,
            text: page.text.clone(),
            text_word_count: word_count(&page.text),
            ocr_word_count: word_count(&ocr_text),
            ocr_text,
            images_with_text,
            combined_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrSummary {
    pub total_text_word_count: usize,
    pub total_ocr_word_count: usize,
    pub combined_word_count: usize,
    pub combined_character_count: usize,
    /// Images that went through OCR.
    pub images_processed: usize,
    pub images_with_text: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrTextReport {
    #[serde(flatten)]
    pub source: SourceRef,
    pub pages_processed: String,
    pub total_pages: u32,
    pub ocr_language: Option<String>,
    pub pages_data: Vec<OcrPage>,
    pub summary: OcrSummary,
    pub combined_text: String,
    pub combined_ocr_text: String,
    pub all_text_combined: String,
}

impl OcrTextReport {
    pub fn assemble(report: &DocumentReport) -> Self {
        let pages_data: Vec<OcrPage> = report.pages.iter().map(OcrPage::from_page).collect();

        let combined_text = join_texts(pages_data.iter().map(|p| p.text.as_str()));
        let combined_ocr_text = join_texts(pages_data.iter().map(|p| p.ocr_text.as_str()));
        let all_text_combined =
            join_texts([combined_text.as_str(), combined_ocr_text.as_str()].into_iter());

        let summary = OcrSummary {
            total_text_word_count: word_count(&combined_text),
            total_ocr_word_count: word_count(&combined_ocr_text),
            combined_word_count: word_count(&all_text_combined),
            combined_character_count: all_text_combined.chars().count(),
            images_processed: report.image_count(),
            images_with_text: pages_data.iter().map(|p| p.images_with_text.len()).sum(),
        };

        Self {
            source: SourceRef::of(report),
            pages_processed: report.range.to_string(),
            total_pages: report.page_count,
            ocr_language: report.ocr_language.clone(),
            pages_data,
            summary,
            combined_text,
            combined_ocr_text,
            all_text_combined,
        }
    }
}

// get-info

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub size_bytes: u64,
    pub size_mb: f64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    /// `creation_date` parsed, when it is a valid PDF date.
    pub created_at: Option<DateTime<FixedOffset>>,
    pub modified_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub total_pages: u32,
    pub total_images: usize,
    pub pages_with_text: usize,
    pub pages_with_images: usize,
    pub is_encrypted: bool,
    pub pdf_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_number: u32,
    pub images_count: usize,
    pub text_length: usize,
    pub has_text: bool,
    pub page_width: Option<f32>,
    pub page_height: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoReport {
    #[serde(flatten)]
    pub source: SourceRef,
    pub file_info: FileInfo,
    pub pdf_metadata: PdfMetadata,
    pub document_stats: DocumentStats,
    pub page_details: Vec<PageInfo>,
}

impl InfoReport {
    pub fn assemble(report: &DocumentReport) -> Self {
        let page_details: Vec<PageInfo> = report
            .pages
            .iter()
            .map(|page| PageInfo {
                page_number: page.number,
                images_count: page.images_found,
                text_length: page.text.chars().count(),
                has_text: page.has_text(),
                page_width: page.geometry.map(|g| g.width),
                page_height: page.geometry.map(|g| g.height),
            })
            .collect();

        let size = report.source.size_bytes;
        let meta = &report.metadata;
        let parse = |raw: &Option<String>| raw.as_deref().and_then(parse_pdf_date);

        Self {
            source: SourceRef::of(report),
            file_info: FileInfo {
                size_bytes: size,
                size_mb: (size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
                modified: report.source.modified,
            },
            pdf_metadata: PdfMetadata {
                title: meta.title.clone(),
                author: meta.author.clone(),
                subject: meta.subject.clone(),
                keywords: meta.keywords.clone(),
                creator: meta.creator.clone(),
                producer: meta.producer.clone(),
                creation_date: meta.creation_date.clone(),
                modification_date: meta.modification_date.clone(),
                created_at: parse(&meta.creation_date),
                modified_at: parse(&meta.modification_date),
            },
            document_stats: DocumentStats {
                total_pages: report.page_count,
                total_images: report.images_found(),
                pages_with_text: page_details.iter().filter(|p| p.has_text).count(),
                pages_with_images: page_details.iter().filter(|p| p.images_count > 0).count(),
                is_encrypted: report.is_encrypted,
                pdf_version: report.pdf_version.clone(),
            },
            page_details,
        }
    }
}

// analyze-structure

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Mixed,
    TextOnly,
    ImagesOnly,
    Empty,
}

impl ContentType {
    fn classify(has_text: bool, has_images: bool) -> Self {
        match (has_text, has_images) {
            (true, true) => ContentType::Mixed,
            (true, false) => ContentType::TextOnly,
            (false, true) => ContentType::ImagesOnly,
            (false, false) => ContentType::Empty,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Mixed => "mixed",
            ContentType::TextOnly => "text_only",
            ContentType::ImagesOnly => "images_only",
            ContentType::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub total_pages: u32,
    pub is_encrypted: bool,
    pub pdf_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub pages_with_text: usize,
    pub pages_with_images: usize,
    pub pages_text_only: usize,
    pub pages_images_only: usize,
    pub pages_mixed_content: usize,
    pub total_text_blocks: usize,
    pub total_images: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStructure {
    pub page_number: u32,
    pub content_type: ContentType,
    pub text_blocks: usize,
    pub image_count: usize,
    pub text_length: usize,
    pub dimensions: Option<Dimensions>,
    pub rotation: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDistribution {
    pub text_only_pages: usize,
    pub images_only_pages: usize,
    pub mixed_content_pages: usize,
    pub empty_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSummary {
    pub content_distribution: ContentDistribution,
    pub avg_images_per_page: f64,
    pub avg_text_blocks_per_page: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureReport {
    #[serde(flatten)]
    pub source: SourceRef,
    pub document_structure: DocumentStructure,
    pub content_analysis: ContentAnalysis,
    pub page_details: Vec<PageStructure>,
    pub summary: StructureSummary,
}

impl StructureReport {
    pub fn assemble(report: &DocumentReport) -> Self {
        let mut analysis = ContentAnalysis::default();
        let mut page_details = Vec::with_capacity(report.pages.len());

        for page in &report.pages {
            let text = page.text.trim();
            let has_text = !text.is_empty();
            let has_images = page.images_found > 0;
            let content_type = ContentType::classify(has_text, has_images);
            let blocks = text_blocks(text);

            match content_type {
                ContentType::Mixed => analysis.pages_mixed_content += 1,
                ContentType::TextOnly => analysis.pages_text_only += 1,
                ContentType::ImagesOnly => analysis.pages_images_only += 1,
                ContentType::Empty => {}
            }
            analysis.pages_with_text += usize::from(has_text);
            analysis.pages_with_images += usize::from(has_images);
            analysis.total_text_blocks += blocks;
            analysis.total_images += page.images_found;

            page_details.push(PageStructure {
                page_number: page.number,
                content_type,
                text_blocks: blocks,
                image_count: page.images_found,
                text_length: text.chars().count(),
                dimensions: page.geometry.map(|g| Dimensions {
                    width: g.width,
                    height: g.height,
                }),
                rotation: page.geometry.map(|g| g.rotation).unwrap_or(0),
            });
        }

        let page_total = report.pages.len();
        let average = |total: usize| {
            if page_total == 0 {
                0.0
            } else {
                (total as f64 / page_total as f64 * 100.0).round() / 100.0
            }
        };

        let summary = StructureSummary {
            content_distribution: ContentDistribution {
                text_only_pages: analysis.pages_text_only,
                images_only_pages: analysis.pages_images_only,
                mixed_content_pages: analysis.pages_mixed_content,
                empty_pages: page_total
                    - analysis.pages_text_only
                    - analysis.pages_images_only
                    - analysis.pages_mixed_content,
            },
            avg_images_per_page: average(analysis.total_images),
            avg_text_blocks_per_page: average(analysis.total_text_blocks),
        };

        Self {
            source: SourceRef::of(report),
            document_structure: DocumentStructure {
                total_pages: report.page_count,
                is_encrypted: report.is_encrypted,
                pdf_version: report.pdf_version.clone(),
            },
            content_analysis: analysis,
            page_details,
            summary,
        }
    }
}
