//! Extracted fields, records and output rows.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Collapse all whitespace runs (including newlines) into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text clipped from one field box on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedField {
    /// Field name from the template.
    pub name: String,
    /// Whitespace-normalized text.
    pub text: String,
}

impl ExtractedField {
    /// Create a field from raw clipped text, normalizing its whitespace.
    pub fn new(name: impl Into<String>, raw_text: &str) -> Self {
        Self {
            name: name.into(),
            text: normalize_whitespace(raw_text),
        }
    }
}

/// The extracted fields for one document, or one page of a multi-page document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    fields: Vec<ExtractedField>,
}

impl Record {
    /// Create a record, checking it has exactly as many fields as the template declares.
    pub fn new(fields: Vec<ExtractedField>, declared: usize) -> Result<Self, RecordError> {
        if fields.len() != declared {
            return Err(RecordError::IncompleteRecord {
                extracted: fields.len(),
                declared,
            });
        }
        Ok(Self { fields })
    }

    /// Append another page's record (multi-page forms).
    pub fn extend(&mut self, other: Record) {
        self.fields.extend(other.fields);
    }

    pub fn fields(&self) -> &[ExtractedField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Identity of the source document, rendered in the first output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRef {
    /// Display name (underscore-normalized file name).
    pub file_name: String,
    /// Where the document lives after the batch (link target).
    pub location: PathBuf,
}

/// One named cell of an output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Column header (the template field name).
    pub name: String,
    /// Display text after field rules.
    pub value: String,
}

/// A record after field rules, ready for the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    /// Source document; attached by the batch pipeline.
    pub document: Option<DocumentRef>,
    /// Field cells in template order.
    pub cells: Vec<Cell>,
}

impl OutputRow {
    /// Attach the document identity column.
    pub fn with_document(mut self, document: DocumentRef) -> Self {
        self.document = Some(document);
        self
    }

    /// Column headers for the field cells.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.name.as_str())
    }

    /// Display values for the field cells.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.value.as_str())
    }
}
