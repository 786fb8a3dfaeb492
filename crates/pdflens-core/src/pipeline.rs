//! Per-page extraction and analysis pipeline.
//!
//! A run resolves the source, opens the document, selects the page range and
//! walks pages in order. Only request-level problems fail a run; a broken page
//! or image becomes a [`Warning`] and the walk continues.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::analysis::{ImageAnalyzer, ImageFilter};
use crate::error::{PdflensError, Result};
use crate::models::{
    DocumentReport, ExtractedImage, ImageRecord, PageContent, StageOutcome, Warning, WarningStage,
};
use crate::pdf::{DocumentOpener, PdfDocument};
use crate::range::{PageRange, RangeRequest};
use crate::source::{SourceResolver, SourceSpec};

/// What to do with each page's images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Text only; images are never extracted.
    TextOnly,
    /// Text, plus OCR of every kept image. No captioning, nothing written.
    OcrOnly { ocr_language: String },
    /// Images only: optionally written to `output_dir`, optionally analyzed.
    Full {
        analyze: bool,
        use_vision: bool,
        ocr_language: String,
        output_dir: Option<PathBuf>,
    },
    /// Text plus image counts; images are not decoded.
    Census,
}

impl ExtractionMode {
    fn extracts_text(&self) -> bool {
        !matches!(self, ExtractionMode::Full { .. })
    }

    fn ocr_language(&self) -> Option<&str> {
        match self {
            ExtractionMode::OcrOnly { ocr_language } => Some(ocr_language),
            ExtractionMode::Full {
                analyze: true,
                ocr_language,
                ..
            } => Some(ocr_language),
            _ => None,
        }
    }
}

/// Orchestrates one extraction run.
#[derive(Clone)]
pub struct Pipeline {
    resolver: SourceResolver,
    opener: Arc<dyn DocumentOpener>,
    filter: ImageFilter,
    analyzer: ImageAnalyzer,
    /// 0 = unlimited.
    max_images_per_page: usize,
}

impl Pipeline {
    pub fn new(
        resolver: SourceResolver,
        opener: Arc<dyn DocumentOpener>,
        filter: ImageFilter,
        analyzer: ImageAnalyzer,
    ) -> Self {
        Self {
            resolver,
            opener,
            filter,
            analyzer,
            max_images_per_page: 0,
        }
    }

    pub fn with_max_images_per_page(mut self, max: usize) -> Self {
        self.max_images_per_page = max;
        self
    }

    /// Run the pipeline. `range: None` processes the whole document.
    pub fn run(
        &self,
        source: &SourceSpec,
        range: Option<RangeRequest>,
        mode: &ExtractionMode,
    ) -> Result<DocumentReport> {
        let start = Instant::now();

        let resolved = self.resolver.resolve(source)?;
        let document = self.opener.open(resolved.path())?;

        // Not before the document opens: hard failures leave no directory.
        let output_dir = match mode {
            ExtractionMode::Full {
                output_dir: Some(dir),
                ..
            } => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    PdflensError::InvalidArgument(format!(
                        "cannot create output directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                Some(dir.clone())
            }
            _ => None,
        };

        let page_count = document.page_count();
        let range = PageRange::select(range, page_count);
        debug!("Processing pages {} of {}", range, page_count);

        let mut warnings = Vec::new();
        let pages: Vec<PageContent> = range
            .pages()
            .map(|page| self.process_page(document.as_ref(), page, mode, &mut warnings))
            .collect();

        let report = DocumentReport {
            source: resolved.info().clone(),
            metadata: document.metadata(),
            page_count,
            is_encrypted: document.is_encrypted(),
            pdf_version: document.version(),
            range,
            pages,
            warnings,
            output_dir,
            ocr_language: mode.ocr_language().map(str::to_string),
        };

        info!(
            "Processed {} pages ({} images, {} warnings) in {}ms",
            report.pages.len(),
            report.image_count(),
            report.warnings.len(),
            start.elapsed().as_millis()
        );

        Ok(report)
    }

    fn process_page(
        &self,
        document: &dyn PdfDocument,
        page: u32,
        mode: &ExtractionMode,
        warnings: &mut Vec<Warning>,
    ) -> PageContent {
        let mut content = PageContent::empty(page);
        content.geometry = document.page_geometry(page);

        if mode.extracts_text() {
            match document.page_text(page) {
                Ok(text) => content.text = text,
                Err(e) => record(warnings, Warning::page(page, WarningStage::Text, e.to_string())),
            }
        }

        match mode {
            ExtractionMode::TextOnly => {}
            ExtractionMode::Census => match document.page_image_count(page) {
                Ok(count) => content.images_found = count,
                Err(e) => record(warnings, Warning::page(page, WarningStage::Images, e.to_string())),
            },
            ExtractionMode::OcrOnly { .. } | ExtractionMode::Full { .. } => {
                match document.page_images(page) {
                    Ok(images) => self.process_images(&mut content, images, mode, warnings),
                    Err(e) => {
                        record(warnings, Warning::page(page, WarningStage::Images, e.to_string()))
                    }
                }
            }
        }

        debug!(
            "Page {}: {} chars, {} images kept, {} filtered",
            page,
            content.text.len(),
            content.images.len(),
            content.images_filtered
        );
        content
    }

    fn process_images(
        &self,
        content: &mut PageContent,
        images: Vec<ExtractedImage>,
        mode: &ExtractionMode,
        warnings: &mut Vec<Warning>,
    ) {
        content.images_found = images.len();

        for image in images {
            let at_limit =
                self.max_images_per_page > 0 && content.images.len() >= self.max_images_per_page;
            if at_limit || !self.filter.keep(&image) {
                content.images_filtered += 1;
                continue;
            }

            let record = self.process_image(&image, mode, warnings);
            content.images.push(record);
        }
    }

    fn process_image(
        &self,
        image: &ExtractedImage,
        mode: &ExtractionMode,
        warnings: &mut Vec<Warning>,
    ) -> ImageRecord {
        let mut image_record = ImageRecord::from_image(image);

        let analysis = match mode {
            ExtractionMode::OcrOnly { ocr_language } => {
                Some(self.analyzer.analyze(image, ocr_language, false))
            }
            ExtractionMode::Full {
                analyze,
                use_vision,
                ocr_language,
                output_dir,
            } => {
                if let Some(dir) = output_dir {
                    let path = dir.join(image.file_name());
                    match std::fs::write(&path, &image.data) {
                        Ok(()) => image_record.path = Some(path),
                        Err(e) => record(
                            warnings,
                            Warning::image(
                                image.page,
                                image.index,
                                WarningStage::Persist,
                                format!("failed to write {}: {}", path.display(), e),
                            ),
                        ),
                    }
                }
                analyze.then(|| self.analyzer.analyze(image, ocr_language, *use_vision))
            }
            ExtractionMode::TextOnly | ExtractionMode::Census => None,
        };

        if let Some(analysis) = &analysis {
            let stages = [
                (WarningStage::Ocr, &analysis.ocr),
                (WarningStage::Caption, &analysis.captioning),
            ];
            for (stage, outcome) in stages {
                if let StageOutcome::Failed(message) = outcome {
                    record(warnings, Warning::image(image.page, image.index, stage, message.clone()));
                }
            }
        }

        image_record.analysis = analysis;
        image_record
    }
}

fn record(warnings: &mut Vec<Warning>, warning: Warning) {
    match warning.image {
        Some(image) => warn!(
            "Page {} image {} ({:?}): {}",
            warning.page, image, warning.stage, warning.message
        ),
        None => warn!("Page {} ({:?}): {}", warning.page, warning.stage, warning.message),
    }
    warnings.push(warning);
}
