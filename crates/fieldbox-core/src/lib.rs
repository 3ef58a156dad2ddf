//! Core library for template-driven PDF form extraction.
//!
//! This crate provides:
//! - Template model (named field boxes keyed by page)
//! - PDF text layer (positioned glyphs from text-based PDFs)
//! - Coordinate extraction and rule-based row building
//! - CSV output table and the batch pipeline over a source directory

pub mod batch;
pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod rows;
pub mod sink;

pub use batch::{
    BatchObserver, BatchOptions, BatchPipeline, BatchReport, DocumentOutcome, DocumentStatus,
    PageLayout,
};
pub use error::{FieldboxError, Result};
pub use extract::{extract, extract_boxes};
pub use models::config::FieldboxConfig;
pub use models::{
    DisplayScale, ExtractedField, FieldBox, OutputRow, PageIndex, Record, Rect, Template,
};
pub use pdf::{PdfDocument, TextSource};
pub use rows::{FieldRule, FieldRuleSet, RuleKind, RuleTable, build_row};
pub use sink::OutputTable;
