//! Error types for the fieldbox-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the fieldbox library.
#[derive(Error, Debug)]
pub enum FieldboxError {
    /// Template authoring or loading error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Row construction error.
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Output table error.
    #[error("output table error: {0}")]
    Sink(#[from] SinkError),

    /// Batch setup or relocation error.
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while authoring, loading or saving templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template artifact is missing or not a page-key to box-list mapping.
    #[error("malformed template {}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    /// A page key does not follow the `page number: N` convention.
    #[error("invalid page key {0:?}, expected \"page number: N\"")]
    InvalidPageKey(String),

    /// A field with the same name already exists on the page.
    #[error("field {name:?} already exists on page {page}")]
    DuplicateField { page: u32, name: String },

    /// The rectangle has zero width or height.
    #[error("degenerate rectangle for field {name:?}: [{x1}, {y1}, {x2}, {y2}]")]
    DegenerateRect {
        name: String,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },

    /// Page numbers are 1-based.
    #[error("page numbers start at 1")]
    ZeroPage,

    /// The template declares no pages at all.
    #[error("template has no field boxes")]
    Empty,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The text layer could not be read from the page content.
    #[error("failed to read page content: {0}")]
    Content(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The template references a page the document does not have.
    #[error("page {page} out of range, document has {page_count} page(s)")]
    PageOutOfRange { page: i64, page_count: u32 },
}

/// Errors raised while turning extracted fields into a row.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The extracted fields and the rule set disagree in length.
    #[error("field count mismatch: {fields} extracted field(s), {rules} rule(s)")]
    FieldCountMismatch { fields: usize, rules: usize },

    /// Extraction produced a different number of fields than the template declares.
    #[error("incomplete record: {extracted} field(s) extracted, template declares {declared}")]
    IncompleteRecord { extracted: usize, declared: usize },

    /// The extracted field at a position is not the one the rule set expects.
    #[error("field {position} is {found:?}, rule set expects {expected:?}")]
    FieldNameMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    /// A rule names a field the template does not declare.
    #[error("rule refers to unknown field {0:?}")]
    UnknownRuleField(String),

    /// A rule could not be compiled.
    #[error("invalid rule for field {field:?}: {reason}")]
    InvalidRule { field: String, reason: String },
}

/// Errors related to the tabular output artifact.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Reading or writing CSV failed.
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Writing the artifact to its final location failed.
    #[error("failed to persist {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },
}

/// Errors raised by the batch pipeline.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The source directory does not exist or is not a directory.
    #[error("source directory not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Moving a processed document failed.
    #[error("failed to move {} to {}: {reason}", .from.display(), .to.display())]
    Relocation {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

/// Result type for the fieldbox library.
pub type Result<T> = std::result::Result<T, FieldboxError>;
