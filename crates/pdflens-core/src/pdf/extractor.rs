//! PDF text and image extraction using lopdf and pdf-extract.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use lopdf::{Document, ObjectId};
use tracing::{debug, trace};

use super::images::{decode_image, page_image_streams, resolve_inherited};
use super::metadata::read_metadata;
use super::{DocumentOpener, PdfDocument, Result};
use crate::error::PdfError;
use crate::models::{DocumentMetadata, ExtractedImage, PageGeometry};

/// Opens documents with lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfOpener;

impl LopdfOpener {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentOpener for LopdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>> {
        let data = std::fs::read(path).map_err(PdfError::Read)?;
        Ok(Box::new(LopdfDocument::load(&data)?))
    }
}

/// A document loaded into memory.
pub struct LopdfDocument {
    document: Document,
    /// Decrypted bytes handed to pdf-extract.
    raw_data: Vec<u8>,
    pages: BTreeMap<u32, ObjectId>,
    encrypted: bool,
    /// Per-page text from pdf-extract, computed on first use.
    /// `None` if pdf-extract could not handle the file.
    extracted_text: OnceCell<Option<Vec<String>>>,
}

impl LopdfDocument {
    /// Parse a PDF from bytes, decrypting it if it opens with an empty password.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let encrypted = document.is_encrypted();
        let raw_data = if encrypted {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let pages = document.get_pages();
        debug!("Loaded PDF {} with {} pages", document.version, pages.len());

        Ok(Self {
            document,
            raw_data,
            pages,
            encrypted,
            extracted_text: OnceCell::new(),
        })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages.get(&page).copied().ok_or(PdfError::InvalidPage(page))
    }

    fn extracted_text(&self) -> Option<&Vec<String>> {
        self.extracted_text
            .get_or_init(|| {
                // pdf-extract panics on some malformed fonts; treat that as a failure.
                let result = catch_unwind(AssertUnwindSafe(|| {
                    pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
                }));
                match result {
                    Ok(Ok(pages)) if pages.len() == self.pages.len() => Some(pages),
                    Ok(Ok(pages)) => {
                        debug!(
                            "pdf-extract returned {} pages, expected {}; using lopdf",
                            pages.len(),
                            self.pages.len()
                        );
                        None
                    }
                    Ok(Err(e)) => {
                        debug!("pdf-extract failed: {}; using lopdf", e);
                        None
                    }
                    Err(_) => {
                        debug!("pdf-extract panicked; using lopdf");
                        None
                    }
                }
            })
            .as_ref()
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;

        if let Some(text) = self
            .extracted_text()
            .and_then(|pages| pages.get(page as usize - 1))
        {
            return Ok(text.trim().to_string());
        }

        let text = catch_unwind(AssertUnwindSafe(|| self.document.extract_text(&[page])))
            .map_err(|_| PdfError::TextExtraction(format!("page {}: extractor panicked", page)))?
            .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))?;
        Ok(text.trim().to_string())
    }

    fn page_images(&self, page: u32) -> Result<Vec<ExtractedImage>> {
        let page_id = self.page_id(page)?;

        let mut images = Vec::new();
        for (i, stream) in page_image_streams(&self.document, page_id).into_iter().enumerate() {
            let index = i as u32 + 1;
            match decode_image(&self.document, stream, page, index) {
                Ok(image) => images.push(image),
                Err(e) => trace!("Skipping image {} on page {}: {}", index, page, e),
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    fn page_image_count(&self, page: u32) -> Result<usize> {
        let page_id = self.page_id(page)?;
        Ok(page_image_streams(&self.document, page_id).len())
    }

    fn page_geometry(&self, page: u32) -> Option<PageGeometry> {
        let page_id = self.page_id(page).ok()?;
        let media_box = resolve_inherited(&self.document, page_id, b"MediaBox")?;
        let (_, media_box) = self.document.dereference(media_box).ok()?;
        let coords: Vec<f32> = media_box
            .as_array()
            .ok()?
            .iter()
            .filter_map(|o| o.as_float().ok())
            .collect();
        let [x0, y0, x1, y1] = coords[..] else {
            return None;
        };

        let rotation = resolve_inherited(&self.document, page_id, b"Rotate")
            .and_then(|r| r.as_i64().ok())
            .unwrap_or(0);

        Some(PageGeometry {
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
            rotation,
        })
    }

    fn metadata(&self) -> DocumentMetadata {
        read_metadata(&self.document)
    }

    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn version(&self) -> String {
        self.document.version.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};
    use pretty_assertions::assert_eq;

    use crate::error::{ErrorKind, PdflensError};

    /// A page description for [`build_pdf`].
    pub(crate) struct TestPage<'a> {
        pub text: Option<&'a str>,
        /// Gray images as (width, height).
        pub images: Vec<(u32, u32)>,
    }

    /// Build an in-memory PDF with Helvetica text and flat gray images.
    pub(crate) fn build_pdf(pages: &[TestPage<'_>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids = Vec::new();
        for page in pages {
            let mut operations = Vec::new();
            if let Some(text) = page.text {
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ]);
            }

            let mut xobjects = lopdf::Dictionary::new();
            for (i, &(w, h)) in page.images.iter().enumerate() {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => w as i64,
                        "Height" => h as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    vec![200; (w * h) as usize],
                ));
                xobjects.set(format!("Im{}", i + 1), image_id);
            }

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap_or_default(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::from(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = LopdfDocument::load(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_page_count_and_geometry() {
        let data = build_pdf(&[
            TestPage { text: Some("first"), images: vec![] },
            TestPage { text: None, images: vec![] },
        ]);
        let doc = LopdfDocument::load(&data).unwrap();

        assert_eq!(doc.page_count(), 2);
        assert!(!doc.is_encrypted());
        assert_eq!(doc.version(), "1.5");
        assert_eq!(
            doc.page_geometry(1),
            Some(PageGeometry { width: 612.0, height: 792.0, rotation: 0 })
        );
        assert_eq!(doc.page_geometry(3), None);
    }

    #[test]
    fn test_page_text() {
        let data = build_pdf(&[
            TestPage { text: Some("Hello from page one"), images: vec![] },
            TestPage { text: None, images: vec![] },
        ]);
        let doc = LopdfDocument::load(&data).unwrap();

        assert!(doc.page_text(1).unwrap().contains("Hello from page one"));
        assert_eq!(doc.page_text(2).unwrap(), "");
        assert!(matches!(doc.page_text(9), Err(PdfError::InvalidPage(9))));
    }

    #[test]
    fn test_page_images_keep_sequence_numbers() {
        let data = build_pdf(&[TestPage { text: None, images: vec![(20, 20), (200, 120)] }]);
        let doc = LopdfDocument::load(&data).unwrap();

        assert_eq!(doc.page_image_count(1).unwrap(), 2);
        let images = doc.page_images(1).unwrap();
        let summary: Vec<(u32, u32, u32)> =
            images.iter().map(|i| (i.index, i.width, i.height)).collect();
        assert_eq!(summary, vec![(1, 20, 20), (2, 200, 120)]);
    }

    #[test]
    fn test_opener_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_pdf(&[TestPage { text: Some("x"), images: vec![] }])).unwrap();

        let doc = LopdfOpener::new().open(&path).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_unreadable_file_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = match LopdfOpener::new().open(&dir.path().join("missing.pdf")) {
            Err(err) => err,
            Ok(_) => panic!("opened a missing file"),
        };
        assert!(matches!(err, PdfError::Read(_)));
        assert_eq!(PdflensError::from(err).kind(), ErrorKind::SourceError);

        let garbage = dir.path().join("garbage.pdf");
        std::fs::write(&garbage, b"not a pdf").unwrap();
        let err = match LopdfOpener::new().open(&garbage) {
            Err(err) => err,
            Ok(_) => panic!("parsed garbage"),
        };
        assert_eq!(PdflensError::from(err).kind(), ErrorKind::DecodeError);
    }
}
