//! PDF processing module.

mod extractor;
mod images;
mod metadata;

pub use extractor::{LopdfDocument, LopdfOpener};
pub use metadata::parse_pdf_date;

#[cfg(test)]
pub(crate) use extractor::tests::{TestPage, build_pdf};

use std::path::Path;

use crate::error::PdfError;
use crate::models::{DocumentMetadata, ExtractedImage, PageGeometry};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// An opened PDF.
///
/// Page numbers are 1-indexed. Per-page methods fail independently so that a
/// broken page does not take the rest of the document with it.
pub trait PdfDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Native text of a page. An empty string when the page has none.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Embedded images of a page in page order, numbered from 1.
    fn page_images(&self, page: u32) -> Result<Vec<ExtractedImage>>;

    /// Number of embedded images on a page, without decoding them.
    fn page_image_count(&self, page: u32) -> Result<usize> {
        Ok(self.page_images(page)?.len())
    }

    /// Page size and rotation, if the page declares them.
    fn page_geometry(&self, page: u32) -> Option<PageGeometry>;

    /// Document information dictionary.
    fn metadata(&self) -> DocumentMetadata;

    /// Whether the file was encrypted (even if it opened with an empty password).
    fn is_encrypted(&self) -> bool;

    /// PDF header version, e.g. `1.7`.
    fn version(&self) -> String;
}

/// Opens PDF files into [`PdfDocument`]s.
pub trait DocumentOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>>;
}
