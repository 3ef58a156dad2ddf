//! Glyph collection on top of pdf-extract's content-stream processor.

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::trace;

use super::{Glyph, PageGlyphs};

/// Glyph box extent above the baseline, as a fraction of the font size.
const ASCENT: f64 = 0.8;
/// Glyph box extent below the baseline.
const DESCENT: f64 = 0.2;

/// An [`OutputDev`] that records every shown character with its box.
///
/// pdf-extract resolves fonts (core-font metrics, `/Widths`, encodings,
/// `ToUnicode`) and hands over the text rendering matrix; this turns each
/// character into a [`Glyph`] in top-left-origin page points.
#[derive(Default)]
pub(crate) struct GlyphCollector {
    pages: Vec<PageGlyphs>,
    current: Option<OpenPage>,
}

struct OpenPage {
    llx: f64,
    ury: f64,
    width: f64,
    height: f64,
    glyphs: Vec<Glyph>,
}

impl GlyphCollector {
    /// Pages in the order they were walked.
    pub(crate) fn into_pages(self) -> Vec<PageGlyphs> {
        self.pages
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        trace!("Collecting glyphs of page {}", page_num);
        let (llx, urx) = (media_box.llx.min(media_box.urx), media_box.llx.max(media_box.urx));
        let (lly, ury) = (media_box.lly.min(media_box.ury), media_box.lly.max(media_box.ury));
        self.current = Some(OpenPage {
            llx,
            ury,
            width: urx - llx,
            height: ury - lly,
            glyphs: Vec::new(),
        });
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        if let Some(page) = self.current.take() {
            trace!("Page done, {} glyph(s)", page.glyphs.len());
            self.pages
                .push(PageGlyphs::new(page.width, page.height, page.glyphs));
        }
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let Some(page) = self.current.as_mut() else {
            return Ok(());
        };
        if char.is_empty() {
            return Ok(());
        }

        // The rendering matrix carries CTM, text matrix and horizontal
        // scaling; the font size and glyph width come separately.
        let size = font_size * trm.m21.hypot(trm.m22);
        let advance = width * font_size * trm.m11.hypot(trm.m12);
        let x = trm.m31 - page.llx;
        let baseline = page.ury - trm.m32;

        page.glyphs.push(Glyph {
            text: char.to_string(),
            x0: x,
            y0: baseline - ASCENT * size,
            x1: x + advance,
            y1: baseline + DESCENT * size,
            size,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
