//! Data models: geometry, templates, records and configuration.

pub mod config;
pub mod geometry;
pub mod record;
pub mod template;

pub use geometry::{DisplayScale, PageIndex, Rect};
pub use record::{Cell, DocumentRef, ExtractedField, OutputRow, Record};
pub use template::{FieldBox, Template};
