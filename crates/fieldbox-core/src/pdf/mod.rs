//! PDF processing module: positioned text on document pages.

mod collector;
mod document;
#[cfg(test)]
pub(crate) mod fixtures;

pub use document::PdfDocument;

use std::cmp::Ordering;

use crate::error::PdfError;
use crate::models::{PageIndex, Rect};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A source of positioned page text.
///
/// The coordinate extractor only needs page count and glyph positions, so
/// anything that can supply those (a parsed PDF, a test double) works.
pub trait TextSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// All glyphs on a page, in top-left-origin document points.
    fn page_glyphs(&self, page: PageIndex) -> Result<PageGlyphs>;
}

/// A single rendered glyph (or ligature) with its bounding box.
///
/// Coordinates use a top-left origin: `y0` is the top edge and `y1` the
/// bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Unicode text for the glyph.
    pub text: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Effective font size in points.
    pub size: f64,
}

impl Glyph {
    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    fn height(&self) -> f64 {
        (self.y1 - self.y0).max(self.size * 0.5).max(0.5)
    }

    fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// Glyphs of one page plus the page dimensions.
#[derive(Debug, Clone, Default)]
pub struct PageGlyphs {
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    glyphs: Vec<Glyph>,
}

impl PageGlyphs {
    pub fn new(width: f64, height: f64, glyphs: Vec<Glyph>) -> Self {
        Self {
            width,
            height,
            glyphs,
        }
    }

    #[cfg(test)]
    pub(crate) fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Text of the glyphs whose centre lies inside `rect`.
    ///
    /// Glyphs are grouped into lines by vertical position and read left to
    /// right; lines are separated by newlines and visible gaps by spaces.
    pub fn text_in(&self, rect: &Rect) -> String {
        let selected: Vec<&Glyph> = self
            .glyphs
            .iter()
            .filter(|g| {
                let (x, y) = g.center();
                rect.contains(x, y)
            })
            .collect();
        assemble_lines(selected)
    }
}

fn assemble_lines(mut glyphs: Vec<&Glyph>) -> String {
    glyphs.sort_by(|a, b| a.center().1.total_cmp(&b.center().1));

    let mut lines: Vec<Vec<&Glyph>> = Vec::new();
    for glyph in glyphs {
        let (_, cy) = glyph.center();
        match lines.last_mut() {
            Some(line)
                if (line[0].center().1 - cy).abs()
                    <= 0.5 * line[0].height().min(glyph.height()) =>
            {
                line.push(glyph)
            }
            _ => lines.push(vec![glyph]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(Ordering::Equal));
            let mut text = String::new();
            let mut prev: Option<&Glyph> = None;
            for glyph in line {
                if let Some(p) = prev {
                    let gap = glyph.x0 - p.x1;
                    if gap > 0.2 * glyph.size.max(1.0) && !p.is_blank() && !glyph.is_blank() {
                        text.push(' ');
                    }
                }
                text.push_str(&glyph.text);
                prev = Some(glyph);
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}
