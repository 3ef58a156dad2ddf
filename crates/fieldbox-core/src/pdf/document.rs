//! PDF document loading, with pdf-extract supplying the text layer.

use std::cell::OnceCell;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use pdf_extract::Document;
use tracing::{debug, warn};

use super::collector::GlyphCollector;
use super::{PageGlyphs, Result, TextSource};
use crate::error::PdfError;
use crate::models::PageIndex;

/// A loaded PDF.
///
/// The text layer of every page is collected in one pass the first time any
/// page is asked for, then reused.
pub struct PdfDocument {
    document: Document,
    page_count: u32,
    pages: OnceCell<Vec<PageGlyphs>>,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&data)
    }

    /// Load a PDF from bytes.
    ///
    /// Documents encrypted with an empty user password are decrypted in place.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = document.get_pages().len() as u32;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            document,
            page_count,
            pages: OnceCell::new(),
        })
    }

    /// Page size in points as `(width, height)`.
    pub fn page_size(&self, page: PageIndex) -> Result<(f64, f64)> {
        let glyphs = self.page(page)?;
        Ok((glyphs.width, glyphs.height))
    }

    fn page(&self, page: PageIndex) -> Result<&PageGlyphs> {
        let out_of_range = || PdfError::PageOutOfRange {
            page: i64::from(page.get()),
            page_count: self.page_count,
        };
        if page.get() > self.page_count {
            return Err(out_of_range());
        }
        self.pages()?.get(page.zero_based()).ok_or_else(out_of_range)
    }

    fn pages(&self) -> Result<&[PageGlyphs]> {
        if let Some(pages) = self.pages.get() {
            return Ok(pages.as_slice());
        }
        let pages = self.collect_glyphs()?;
        Ok(self.pages.get_or_init(|| pages).as_slice())
    }

    fn collect_glyphs(&self) -> Result<Vec<PageGlyphs>> {
        let mut collector = GlyphCollector::default();

        // The content processor panics on some malformed fonts and streams;
        // that must fail this document only.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc(&self.document, &mut collector)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PdfError::Content(format!("{:?}", e))),
            Err(_) => {
                warn!("Content processor panicked");
                return Err(PdfError::Content("content processor panicked".to_string()));
            }
        }

        let pages = collector.into_pages();
        if pages.len() as u32 != self.page_count {
            warn!(
                "Collected {} page(s) of text, document has {}",
                pages.len(),
                self.page_count
            );
        }
        debug!("Collected text layer of {} page(s)", pages.len());
        Ok(pages)
    }
}

impl TextSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_glyphs(&self, page: PageIndex) -> Result<PageGlyphs> {
        self.page(page).cloned()
    }
}
