//! Output table sink: the CSV artifact rows accumulate into.
//!
//! The table keeps every row in memory. Rows become durable only when
//! [`OutputTable::persist`] is called, which rewrites the file atomically.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::SinkError;
use crate::models::{DocumentRef, OutputRow};

/// Header of the document identity column.
pub const FILENAME_HEADER: &str = "filename";

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// The tabular output artifact.
#[derive(Debug, Clone)]
pub struct OutputTable {
    rows: Vec<Vec<String>>,
    hyperlinks: bool,
}

impl OutputTable {
    /// An empty in-memory table.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            hyperlinks: true,
        }
    }

    /// Load the table at `path`, creating an empty file if none exists.
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| persist_error(path, e))?;
            }
            File::create(path).map_err(|e| persist_error(path, e))?;
            debug!("Created output table {}", path.display());
            return Ok(Self::new());
        }

        let csv_error = |source| SinkError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(csv_error)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!("Loaded {} row(s) from {}", rows.len(), path.display());
        Ok(Self {
            rows,
            hyperlinks: true,
        })
    }

    /// Render the filename column as a spreadsheet `HYPERLINK` formula.
    pub fn with_hyperlinks(mut self, hyperlinks: bool) -> Self {
        self.hyperlinks = hyperlinks;
        self
    }

    /// True until the first row (header included) is added.
    pub fn is_pristine(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, writing the header first if the table is pristine.
    pub fn append(&mut self, row: &OutputRow) {
        if self.is_pristine() {
            let mut header = vec![FILENAME_HEADER.to_string()];
            header.extend(row.field_names().map(str::to_string));
            self.rows.push(header);
        } else if let Some(header) = self.header() {
            let matches = header.len() == row.cells.len() + 1
                && header[1..].iter().map(String::as_str).eq(row.field_names());
            if !matches {
                warn!("Row fields do not match the table header; appending anyway");
            }
        }

        let mut cells = vec![self.document_cell(row.document.as_ref())];
        cells.extend(row.values().map(str::to_string));
        self.rows.push(cells);
    }

    /// The header row, if written.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Data rows, header excluded.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.data_rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the table to `path` through a temporary file in the same directory.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| persist_error(path, e))?;

        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(tmp.as_file_mut());
            for row in &self.rows {
                writer.write_record(row).map_err(|source| SinkError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
            writer.flush().map_err(|e| persist_error(path, e))?;
        }

        tmp.persist(path).map_err(|e| persist_error(path, e.error))?;
        debug!("Persisted {} row(s) to {}", self.rows.len(), path.display());
        Ok(())
    }

    fn document_cell(&self, document: Option<&DocumentRef>) -> String {
        match document {
            Some(doc) if self.hyperlinks => {
                // Spreadsheets resolve relative links against the workbook's
                // folder, not the working directory the batch ran in.
                let target = std::path::absolute(&doc.location).unwrap_or_else(|e| {
                    warn!("Keeping relative link for {}: {}", doc.location.display(), e);
                    doc.location.clone()
                });
                hyperlink(&target, &doc.file_name)
            }
            Some(doc) => doc.file_name.clone(),
            None => String::new(),
        }
    }
}

impl Default for OutputTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A spreadsheet formula linking to `target` with `label` as its text.
pub fn hyperlink(target: &Path, label: &str) -> String {
    let quote = |s: &str| s.replace('"', "\"\"");
    format!(
        "=HYPERLINK(\"{}\",\"{}\")",
        quote(&target.to_string_lossy()),
        quote(label)
    )
}

fn persist_error(path: &Path, e: std::io::Error) -> SinkError {
    SinkError::Persist {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn row(file: &str, values: &[(&str, &str)]) -> OutputRow {
        OutputRow {
            document: Some(DocumentRef {
                file_name: file.to_string(),
                location: PathBuf::from("Scanned").join(file),
            }),
            cells: values
                .iter()
                .map(|(name, value)| Cell {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_open_creates_empty_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("data.csv");

        let table = OutputTable::open_or_create(&path).unwrap();
        assert!(path.exists());
        assert!(table.is_pristine());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_header_written_once_across_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");

        for run in 0..2 {
            let mut table = OutputTable::open_or_create(&path).unwrap();
            for i in 0..3 {
                table.append(&row(&format!("doc_{run}_{i}.pdf"), &[("Doc#", "A1"), ("Qty", "2")]));
            }
            table.persist(&path).unwrap();
        }

        let table = OutputTable::open_or_create(&path).unwrap();
        assert_eq!(
            table.header().unwrap(),
            &["filename".to_string(), "Doc#".to_string(), "Qty".to_string()]
        );
        assert_eq!(table.len(), 6);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 7);
        assert_eq!(content.matches("filename").count(), 1);
    }

    #[test]
    fn test_hyperlink_cell() {
        let mut table = OutputTable::new();
        table.append(&row("a_b.pdf", &[("X", "1")]));
        let target = std::env::current_dir().unwrap().join("Scanned").join("a_b.pdf");
        assert_eq!(
            table.data_rows()[0],
            vec![
                format!("=HYPERLINK(\"{}\",\"a_b.pdf\")", target.display()),
                "1".to_string()
            ]
        );
    }

    #[test]
    fn test_hyperlink_target_is_absolute() {
        let mut table = OutputTable::new();
        table.append(&row("a.pdf", &[("X", "1")]));
        let cell = &table.data_rows()[0][0];
        let target = cell
            .strip_prefix("=HYPERLINK(\"")
            .and_then(|rest| rest.split_once('"'))
            .map(|(target, _)| target)
            .unwrap();
        assert!(Path::new(target).is_absolute(), "{target}");
        assert!(target.ends_with("a.pdf"));
    }

    #[test]
    fn test_plain_filename_cell() {
        let mut table = OutputTable::new().with_hyperlinks(false);
        table.append(&row("a_b.pdf", &[("X", "1")]));
        assert_eq!(table.data_rows()[0][0], "a_b.pdf");
    }

    #[test]
    fn test_hyperlink_escapes_quotes() {
        assert_eq!(
            hyperlink(Path::new("x.pdf"), "say \"hi\""),
            "=HYPERLINK(\"x.pdf\",\"say \"\"hi\"\"\")"
        );
    }

    #[test]
    fn test_values_with_commas_survive_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");

        let mut table = OutputTable::open_or_create(&path).unwrap();
        table.append(&row("a.pdf", &[("Address", "1 Main St, Springfield")]));
        table.persist(&path).unwrap();

        let reloaded = OutputTable::open_or_create(&path).unwrap();
        assert_eq!(reloaded.data_rows()[0][1], "1 Main St, Springfield");
    }
}
