//! Coordinate extractor: resolves template field boxes against document pages.

use tracing::debug;

use crate::error::PdfError;
use crate::models::{ExtractedField, FieldBox, PageIndex, Template};
use crate::pdf::TextSource;

/// Extract the fields the template declares for `page`.
///
/// Returns an empty list when the template has no fields on that page. The
/// page must exist in the document either way.
pub fn extract<D: TextSource + ?Sized>(
    doc: &D,
    template: &Template,
    page: PageIndex,
) -> Result<Vec<ExtractedField>, PdfError> {
    check_page(doc, page)?;
    extract_boxes(doc, template.fields(page), page)
}

/// Extract an explicit list of field boxes from a document page.
///
/// The boxes' own page is ignored; this is how a one-page template is
/// applied to every page of a longer document.
pub fn extract_boxes<D: TextSource + ?Sized>(
    doc: &D,
    boxes: &[FieldBox],
    page: PageIndex,
) -> Result<Vec<ExtractedField>, PdfError> {
    check_page(doc, page)?;
    if boxes.is_empty() {
        return Ok(Vec::new());
    }

    let glyphs = doc.page_glyphs(page)?;
    let fields: Vec<ExtractedField> = boxes
        .iter()
        .map(|field| {
            let field = ExtractedField::new(field.name.clone(), &glyphs.text_in(&field.rect));
            debug!("page {} {} = {:?}", page, field.name, field.text);
            field
        })
        .collect();

    Ok(fields)
}

fn check_page<D: TextSource + ?Sized>(doc: &D, page: PageIndex) -> Result<(), PdfError> {
    let page_count = doc.page_count();
    if page.get() > page_count {
        return Err(PdfError::PageOutOfRange {
            page: i64::from(page.get()),
            page_count,
        });
    }
    Ok(())
}
