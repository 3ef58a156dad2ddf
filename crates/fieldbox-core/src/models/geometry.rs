//! Page indices and rectangles in document-point space.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::TemplateError;

/// Prefix of the page keys used by the template interchange format.
pub const PAGE_KEY_PREFIX: &str = "page number: ";

/// A 1-based page number.
///
/// Templates, the CLI and log output all count pages from 1. The only
/// place that needs a 0-based index is slice access into a document's
/// page list, which goes through [`PageIndex::zero_based`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(NonZeroU32);

impl PageIndex {
    /// The first page of a document.
    pub const FIRST: PageIndex = PageIndex(NonZeroU32::MIN);

    /// Create a page index from a 1-based page number.
    pub fn new(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(Self)
    }

    /// The 1-based page number.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The 0-based position of this page in a document's page list.
    pub fn zero_based(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// The page key used in template files, e.g. `page number: 1`.
    pub fn page_key(self) -> String {
        format!("{PAGE_KEY_PREFIX}{}", self.0)
    }

    /// Parse a template page key of the form `page number: N`.
    pub fn from_page_key(key: &str) -> Result<Self, TemplateError> {
        let number = key
            .strip_prefix(PAGE_KEY_PREFIX)
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| TemplateError::InvalidPageKey(key.to_string()))?;

        Self::new(number).ok_or(TemplateError::ZeroPage)
    }

    /// Iterate over all pages `1..=count`.
    pub fn range(count: u32) -> impl Iterator<Item = PageIndex> {
        (1..=count).filter_map(PageIndex::new)
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An axis-aligned rectangle in document points with a top-left origin.
///
/// Always normalized so that `x1 < x2` and `y1 < y2`; zero-area and
/// non-finite rectangles cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl Rect {
    /// Build a rectangle from two opposite corners.
    ///
    /// Corners may be given in any order (a box dragged up and to the left
    /// is still a box). Returns `None` for zero width or height.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return None;
        }
        if x1 == x2 || y1 == y2 {
            return None;
        }
        Some(Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        })
    }

    /// Build a rectangle from `[x1, y1, x2, y2]`.
    pub fn from_coords(coords: [f64; 4]) -> Option<Self> {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    /// The coordinates as `[x1, y1, x2, y2]`.
    pub fn coords(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn y1(&self) -> f64 {
        self.y1
    }

    pub fn x2(&self) -> f64 {
        self.x2
    }

    pub fn y2(&self) -> f64 {
        self.y2
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Whether a point lies inside the rectangle (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

/// Converts rectangles captured in display pixels into document points.
///
/// A page rendered at some zoom level is shown as a `display_width` x
/// `display_height` image; boxes drawn over it must be scaled once, at
/// capture time, before they are stored in a template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale {
    scale_x: f64,
    scale_y: f64,
}

impl DisplayScale {
    /// Create a scale from display size and page size (both `(width, height)`).
    pub fn new(display: (f64, f64), page: (f64, f64)) -> Option<Self> {
        let sizes = [display.0, display.1, page.0, page.1];
        if !sizes.iter().all(|v| v.is_finite() && *v > 0.0) {
            return None;
        }
        Some(Self {
            scale_x: page.0 / display.0,
            scale_y: page.1 / display.1,
        })
    }

    /// Convert a display-space rectangle into document points.
    pub fn to_document(&self, rect: Rect) -> Rect {
        // Positive scale factors keep a valid rectangle valid.
        Rect {
            x1: rect.x1 * self.scale_x,
            y1: rect.y1 * self.scale_y,
            x2: rect.x2 * self.scale_x,
            y2: rect.y2 * self.scale_y,
        }
    }
}
