//! Batch pipeline: applies one template to every PDF in a source directory.
//!
//! Per document the pipeline extracts records, builds rows, relocates the
//! file and appends the rows to the output table. Failures are contained
//! at the document boundary: the file stays in place, its name goes to the
//! failure log and the run continues.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::{BatchError, Result, TemplateError};
use crate::extract::{extract, extract_boxes};
use crate::models::config::{FieldboxConfig, LayoutMode};
use crate::models::{DocumentRef, OutputRow, PageIndex, Record, Template};
use crate::pdf::{PdfDocument, TextSource};
use crate::rows::{FieldRuleSet, RuleTable, build_row};
use crate::sink::OutputTable;

/// Default failure log name, created inside the source directory.
pub const FAILURE_LOG: &str = "_failed_files.log";

/// How a template maps onto the pages of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    /// The template's first page is applied to every document page; each
    /// page yields its own row.
    RepeatFirstPage,
    /// Each template page is read from the matching document page and the
    /// results are joined into one row per document.
    SpanPages,
}

impl PageLayout {
    /// Pick the layout for a template.
    pub fn resolve(mode: LayoutMode, template: &Template) -> Self {
        match mode {
            LayoutMode::Repeat => Self::RepeatFirstPage,
            LayoutMode::Span => Self::SpanPages,
            LayoutMode::Auto if template.page_count() > 1 => Self::SpanPages,
            LayoutMode::Auto => Self::RepeatFirstPage,
        }
    }

    /// Field names making up one row, in column order.
    pub fn row_fields(self, template: &Template) -> Vec<String> {
        match self {
            Self::RepeatFirstPage => template
                .first_page()
                .map(|page| template.fields(page).iter().map(|f| f.name.clone()).collect())
                .unwrap_or_default(),
            Self::SpanPages => template.iter().map(|f| f.name.clone()).collect(),
        }
    }
}

/// Batch pipeline settings.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Move processed documents to the destination directory.
    pub relocate: bool,
    /// Relocate into a per-run timestamped subfolder of the destination.
    pub timestamped_subfolder: bool,
    /// Page layout selection.
    pub layout: LayoutMode,
    /// Failure log file name inside the source directory.
    pub failure_log: String,
    /// Persist the output table every N processed documents.
    pub persist_every: Option<usize>,
    /// Where checkpoints are persisted; checkpoints are off without it.
    pub output_path: Option<PathBuf>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            relocate: true,
            timestamped_subfolder: false,
            layout: LayoutMode::Auto,
            failure_log: FAILURE_LOG.to_string(),
            persist_every: None,
            output_path: None,
        }
    }
}

impl BatchOptions {
    /// Options from the batch and path sections of a configuration.
    pub fn from_config(config: &FieldboxConfig) -> Self {
        Self {
            relocate: config.batch.relocate,
            timestamped_subfolder: config.batch.timestamped_subfolder,
            layout: config.batch.layout,
            failure_log: config.paths.failure_log.clone(),
            persist_every: config.batch.persist_every,
            output_path: Some(config.paths.output_in(&config.paths.scanned)),
        }
    }
}

/// Terminal state of one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Rows were appended and the document relocated.
    Processed { rows: usize, location: PathBuf },
    /// Extraction, row building or relocation failed.
    Failed { reason: String },
    /// Not a candidate (subdirectory or non-PDF file).
    Skipped { reason: String },
}

/// Outcome for one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    /// Entry name in the source directory.
    pub file_name: String,
    pub status: DocumentStatus,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rows_appended: usize,
    /// Every entry in enumeration order.
    pub outcomes: Vec<DocumentOutcome>,
    /// Failure log path, set when at least one failure was logged.
    pub failure_log: Option<PathBuf>,
}

impl BatchReport {
    /// Names of the documents that failed.
    pub fn failed_files(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DocumentStatus::Failed { .. }))
            .map(|o| o.file_name.as_str())
    }
}

/// Progress callbacks for a batch run.
pub trait BatchObserver {
    /// Called once with the number of directory entries.
    fn discovered(&mut self, _total: usize) {}

    /// Called after each entry reaches a terminal state.
    fn finished(&mut self, _outcome: &DocumentOutcome) {}
}

/// Observer that ignores all events.
pub struct SilentObserver;

impl BatchObserver for SilentObserver {}

/// A template bound to its rules, ready to run over directories.
pub struct BatchPipeline<'a> {
    template: &'a Template,
    layout: PageLayout,
    rules: FieldRuleSet,
    options: BatchOptions,
}

impl<'a> BatchPipeline<'a> {
    /// Bind the rule table to the template's row fields.
    ///
    /// Rule drift (a rule naming a field the template lacks) fails here,
    /// before any document is touched.
    pub fn new(template: &'a Template, rules: &RuleTable, options: BatchOptions) -> Result<Self> {
        if template.is_empty() {
            return Err(TemplateError::Empty.into());
        }
        let layout = PageLayout::resolve(options.layout, template);
        let rules = FieldRuleSet::bind(rules, &layout.row_fields(template))?;
        debug!("Batch layout {:?} with {} column(s)", layout, rules.len());

        Ok(Self {
            template,
            layout,
            rules,
            options,
        })
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Output header: the filename column followed by the row fields.
    pub fn header(&self) -> Vec<String> {
        std::iter::once(crate::sink::FILENAME_HEADER.to_string())
            .chain(self.rules.names().map(str::to_string))
            .collect()
    }

    /// Extract and build the rows for one document without side effects.
    pub fn process_document<D: TextSource + ?Sized>(&self, doc: &D) -> Result<Vec<OutputRow>> {
        let records = self.records(doc)?;
        let rows = records
            .iter()
            .map(|record| build_row(record.fields(), &self.rules))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn records<D: TextSource + ?Sized>(&self, doc: &D) -> Result<Vec<Record>> {
        match self.layout {
            PageLayout::RepeatFirstPage => {
                let boxes = self
                    .template
                    .first_page()
                    .map(|page| self.template.fields(page))
                    .unwrap_or_default();
                PageIndex::range(doc.page_count())
                    .map(|page| -> Result<Record> {
                        let fields = extract_boxes(doc, boxes, page)?;
                        Ok(Record::new(fields, boxes.len())?)
                    })
                    .collect()
            }
            PageLayout::SpanPages => {
                let mut record = Record::default();
                for page in self.template.pages() {
                    let fields = extract(doc, self.template, page)?;
                    record.extend(Record::new(fields, self.template.fields(page).len())?);
                }
                Ok(vec![record])
            }
        }
    }

    /// Run over every entry of `source_dir`.
    pub fn run(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        table: &mut OutputTable,
        observer: &mut dyn BatchObserver,
    ) -> Result<BatchReport> {
        if !source_dir.is_dir() {
            return Err(BatchError::SourceMissing(source_dir.to_path_buf()).into());
        }

        let mut entries: Vec<fs::DirEntry> =
            fs::read_dir(source_dir)?.collect::<std::io::Result<_>>()?;
        entries.sort_by_key(|e| e.file_name());
        observer.discovered(entries.len());
        info!("Found {} entries in {}", entries.len(), source_dir.display());

        let target_dir = if self.options.timestamped_subfolder {
            dest_dir.join(Local::now().format("%Y%m%d_%H%M%S").to_string())
        } else {
            dest_dir.to_path_buf()
        };
        let log_path = source_dir.join(&self.options.failure_log);
        let mut report = BatchReport::default();

        for entry in entries {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            let status = if path.is_dir() {
                DocumentStatus::Skipped {
                    reason: "directory".to_string(),
                }
            } else if !is_pdf(&path) {
                DocumentStatus::Skipped {
                    reason: "not a PDF".to_string(),
                }
            } else {
                match self.run_document(&path, &file_name, &target_dir, table) {
                    Ok((rows, location)) => {
                        info!("Processed {} ({} row(s))", file_name, rows);
                        DocumentStatus::Processed { rows, location }
                    }
                    Err(e) => {
                        warn!("Failed to process {}: {}", file_name, e);
                        log_failure(&log_path, &file_name);
                        report.failure_log = Some(log_path.clone());
                        DocumentStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            };

            match &status {
                DocumentStatus::Processed { rows, .. } => {
                    report.processed += 1;
                    report.rows_appended += rows;
                    self.checkpoint(table, report.processed);
                }
                DocumentStatus::Failed { .. } => report.failed += 1,
                DocumentStatus::Skipped { reason } => {
                    info!("Skipping {}: {}", file_name, reason);
                    report.skipped += 1;
                }
            }

            let outcome = DocumentOutcome { file_name, status };
            observer.finished(&outcome);
            report.outcomes.push(outcome);
        }

        info!(
            "Batch finished: {} processed, {} failed, {} skipped",
            report.processed, report.failed, report.skipped
        );
        Ok(report)
    }

    /// Extract, build, relocate, append. Rows are appended only once the
    /// document is in its final location.
    fn run_document(
        &self,
        path: &Path,
        file_name: &str,
        target_dir: &Path,
        table: &mut OutputTable,
    ) -> Result<(usize, PathBuf)> {
        let doc = PdfDocument::open(path)?;
        let rows = self.process_document(&doc)?;
        drop(doc);

        let display_name = normalize_file_name(file_name);
        let location = if self.options.relocate {
            fs::create_dir_all(target_dir)?;
            let target = target_dir.join(&display_name);
            relocate(path, &target)?;
            target
        } else {
            path.to_path_buf()
        };

        let document = DocumentRef {
            file_name: display_name,
            location: location.clone(),
        };
        let count = rows.len();
        for row in rows {
            table.append(&row.with_document(document.clone()));
        }
        Ok((count, location))
    }

    /// Persist every N processed documents. A failed checkpoint is logged
    /// and the batch goes on; the rows stay in memory for the final persist.
    fn checkpoint(&self, table: &OutputTable, processed: usize) {
        let (Some(every), Some(path)) = (self.options.persist_every, &self.options.output_path)
        else {
            return;
        };
        if every == 0 || processed % every != 0 {
            return;
        }
        match table.persist(path) {
            Ok(()) => debug!("Checkpoint after {} document(s)", processed),
            Err(e) => warn!("Checkpoint after {} document(s) failed: {}", processed, e),
        }
    }
}

/// Run a template over `source_dir` with default options.
pub fn run(
    source_dir: &Path,
    dest_dir: &Path,
    template: &Template,
    rules: &RuleTable,
    table: &mut OutputTable,
) -> Result<BatchReport> {
    BatchPipeline::new(template, rules, BatchOptions::default())?.run(
        source_dir,
        dest_dir,
        table,
        &mut SilentObserver,
    )
}

/// Replace spaces in a file name with underscores.
pub fn normalize_file_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Move a file, falling back to copy and delete across filesystems.
/// An existing target is never overwritten.
pub fn relocate(from: &Path, to: &Path) -> std::result::Result<(), BatchError> {
    let error = |reason: String| BatchError::Relocation {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        reason,
    };

    if to.exists() {
        return Err(error("target already exists".to_string()));
    }

    if let Err(rename_err) = fs::rename(from, to) {
        debug!("Rename failed ({}), copying instead", rename_err);
        copy_then_remove(from, to, |p| fs::remove_file(p)).map_err(|e| error(e.to_string()))?;
    }
    Ok(())
}

/// Copy `from` to `to`, then delete `from` with `remove_source`. If the
/// source cannot be deleted the copy is removed again, so the document
/// exists in exactly one place.
fn copy_then_remove(
    from: &Path,
    to: &Path,
    remove_source: impl FnOnce(&Path) -> std::io::Result<()>,
) -> std::io::Result<()> {
    fs::copy(from, to)?;
    if let Err(e) = remove_source(from) {
        if let Err(cleanup) = fs::remove_file(to) {
            warn!("Could not remove partial copy {}: {}", to.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn log_failure(log_path: &Path, file_name: &str) {
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .and_then(|mut log| writeln!(log, "{}", file_name));
    if let Err(e) = result {
        warn!("Could not write failure log {}: {}", log_path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldboxError;
    use crate::pdf::fixtures::form_pdf;
    use crate::rows::{FieldRule, RuleKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const ONE_PAGE: &str = r#"{"page number: 1": [
        {"name": "Doc#", "coords": [0, 0, 100, 20]},
        {"name": "Unit Price", "coords": [0, 30, 100, 50]}
    ]}"#;

    struct Dirs {
        _root: TempDir,
        source: PathBuf,
        dest: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = TempDir::new().unwrap();
        let source = root.path().join("To Scan");
        let dest = root.path().join("Scanned");
        fs::create_dir_all(&source).unwrap();
        Dirs {
            source,
            dest,
            _root: root,
        }
    }

    fn write_form(dir: &Path, name: &str, doc_no: &str, price: &str) {
        fs::write(dir.join(name), form_pdf(&[&[(10, 5, doc_no), (10, 35, price)]])).unwrap();
    }

    fn price_rules() -> RuleTable {
        RuleTable::new(vec![FieldRule::new("Unit Price", RuleKind::SpaceToDecimal)])
    }

    #[test]
    fn test_valid_and_corrupt_documents() {
        let d = dirs();
        write_form(&d.source, "good form.pdf", "ABC123", "12 34");
        fs::write(d.source.join("broken.pdf"), b"%PDF-1.5 garbage").unwrap();

        let template = Template::from_json(ONE_PAGE).unwrap();
        let mut table = OutputTable::new();
        let report = run(&d.source, &d.dest, &template, &price_rules(), &mut table).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_files().collect::<Vec<_>>(), vec!["broken.pdf"]);

        let log = fs::read_to_string(d.source.join(FAILURE_LOG)).unwrap();
        assert_eq!(log, "broken.pdf\n");

        // The corrupt file stays, the good one moves with an underscored name.
        assert!(d.source.join("broken.pdf").exists());
        assert!(!d.source.join("good form.pdf").exists());
        assert!(d.dest.join("good_form.pdf").exists());

        assert_eq!(table.len(), 1);
        assert_eq!(table.data_rows()[0][1..], ["ABC123".to_string(), "12.34".to_string()]);
        assert!(table.data_rows()[0][0].contains("good_form.pdf"));
    }

    #[test]
    fn test_rerun_on_drained_source_is_noop() {
        let d = dirs();
        write_form(&d.source, "a.pdf", "A1", "1 00");
        fs::write(d.source.join("bad.pdf"), b"nope").unwrap();

        let template = Template::from_json(ONE_PAGE).unwrap();
        let mut table = OutputTable::new();
        run(&d.source, &d.dest, &template, &price_rules(), &mut table).unwrap();
        fs::remove_file(d.source.join("bad.pdf")).unwrap();
        let log_before = fs::read_to_string(d.source.join(FAILURE_LOG)).unwrap();
        let rows_before = table.len();

        let report = run(&d.source, &d.dest, &template, &price_rules(), &mut table).unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.rows_appended, 0);
        assert_eq!(table.len(), rows_before);
        assert_eq!(fs::read_to_string(d.source.join(FAILURE_LOG)).unwrap(), log_before);
    }

    #[test]
    fn test_skips_directories_and_other_files() {
        let d = dirs();
        fs::create_dir(d.source.join("nested.pdf")).unwrap();
        fs::write(d.source.join("notes.txt"), "hello").unwrap();
        write_form(&d.source, "UPPER.PDF", "X9", "5 50");

        let template = Template::from_json(ONE_PAGE).unwrap();
        let mut table = OutputTable::new();
        let report = run(&d.source, &d.dest, &template, &RuleTable::default(), &mut table).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 0);
        assert!(report.failure_log.is_none());
        assert!(!d.source.join(FAILURE_LOG).exists());
    }

    #[test]
    fn test_missing_source_directory() {
        let d = dirs();
        let template = Template::from_json(ONE_PAGE).unwrap();
        let err = run(
            &d.source.join("absent"),
            &d.dest,
            &template,
            &RuleTable::default(),
            &mut OutputTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FieldboxError::Batch(BatchError::SourceMissing(_))));
    }

    #[test]
    fn test_unknown_rule_field_fails_before_run() {
        let template = Template::from_json(ONE_PAGE).unwrap();
        let rules = RuleTable::new(vec![FieldRule::new("Total Price", RuleKind::SpaceToDecimal)]);
        assert!(matches!(
            BatchPipeline::new(&template, &rules, BatchOptions::default()),
            Err(FieldboxError::Record(crate::error::RecordError::UnknownRuleField(_)))
        ));
    }

    #[test]
    fn test_repeat_layout_row_per_page() {
        let d = dirs();
        fs::write(
            d.source.join("multi.pdf"),
            form_pdf(&[&[(10, 5, "P1"), (10, 35, "1 0")], &[(10, 5, "P2"), (10, 35, "2 0")]]),
        )
        .unwrap();

        let template = Template::from_json(ONE_PAGE).unwrap();
        let pipeline =
            BatchPipeline::new(&template, &price_rules(), BatchOptions::default()).unwrap();
        assert_eq!(pipeline.layout(), PageLayout::RepeatFirstPage);

        let mut table = OutputTable::new();
        let report = pipeline.run(&d.source, &d.dest, &mut table, &mut SilentObserver).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.rows_appended, 2);
        assert_eq!(table.data_rows()[0][1..], ["P1".to_string(), "1.0".to_string()]);
        assert_eq!(table.data_rows()[1][1..], ["P2".to_string(), "2.0".to_string()]);
    }

    #[test]
    fn test_span_layout_row_per_document() {
        let d = dirs();
        fs::write(
            d.source.join("multi.pdf"),
            form_pdf(&[&[(10, 5, "P1")], &[(10, 5, "P2")]]),
        )
        .unwrap();

        let template = Template::from_json(
            r#"{
                "page number: 1": [{"name": "First", "coords": [0, 0, 100, 20]}],
                "page number: 2": [{"name": "Second", "coords": [0, 0, 100, 20]}]
            }"#,
        )
        .unwrap();
        let pipeline =
            BatchPipeline::new(&template, &RuleTable::default(), BatchOptions::default())
                .unwrap();
        assert_eq!(pipeline.layout(), PageLayout::SpanPages);
        assert_eq!(pipeline.header(), vec!["filename", "First", "Second"]);

        let mut table = OutputTable::new();
        let report = pipeline.run(&d.source, &d.dest, &mut table, &mut SilentObserver).unwrap();
        assert_eq!(report.rows_appended, 1);
        assert_eq!(table.header().unwrap()[1..], ["First".to_string(), "Second".to_string()]);
        assert_eq!(table.data_rows()[0][1..], ["P1".to_string(), "P2".to_string()]);
    }

    #[test]
    fn test_span_layout_short_document_fails() {
        let d = dirs();
        fs::write(d.source.join("short.pdf"), form_pdf(&[&[(10, 5, "P1")]])).unwrap();

        let template = Template::from_json(
            r#"{
                "page number: 1": [{"name": "First", "coords": [0, 0, 100, 20]}],
                "page number: 2": [{"name": "Second", "coords": [0, 0, 100, 20]}]
            }"#,
        )
        .unwrap();
        let mut table = OutputTable::new();
        let report = run(&d.source, &d.dest, &template, &RuleTable::default(), &mut table).unwrap();

        assert_eq!(report.failed, 1);
        assert!(table.is_pristine());
        assert!(d.source.join("short.pdf").exists());
    }

    #[test]
    fn test_existing_target_is_not_overwritten() {
        let d = dirs();
        write_form(&d.source, "a.pdf", "A1", "1 00");
        fs::create_dir_all(&d.dest).unwrap();
        fs::write(d.dest.join("a.pdf"), b"already here").unwrap();

        let template = Template::from_json(ONE_PAGE).unwrap();
        let mut table = OutputTable::new();
        let report = run(&d.source, &d.dest, &template, &RuleTable::default(), &mut table).unwrap();

        assert_eq!(report.failed, 1);
        assert!(table.is_pristine());
        assert!(d.source.join("a.pdf").exists());
        assert_eq!(fs::read(d.dest.join("a.pdf")).unwrap(), b"already here");
    }

    #[test]
    fn test_keep_files_links_to_source() {
        let d = dirs();
        write_form(&d.source, "a b.pdf", "A1", "1 00");

        let template = Template::from_json(ONE_PAGE).unwrap();
        let options = BatchOptions {
            relocate: false,
            ..BatchOptions::default()
        };
        let pipeline = BatchPipeline::new(&template, &RuleTable::default(), options).unwrap();
        let mut table = OutputTable::new().with_hyperlinks(false);
        let report = pipeline.run(&d.source, &d.dest, &mut table, &mut SilentObserver).unwrap();

        assert!(d.source.join("a b.pdf").exists());
        assert_eq!(
            report.outcomes[0].status,
            DocumentStatus::Processed {
                rows: 1,
                location: d.source.join("a b.pdf")
            }
        );
        assert_eq!(table.data_rows()[0][0], "a_b.pdf");
    }

    #[test]
    fn test_checkpoint_persists_table() {
        let d = dirs();
        write_form(&d.source, "a.pdf", "A1", "1 00");
        let output = d.dest.join("data.csv");

        let template = Template::from_json(ONE_PAGE).unwrap();
        let options = BatchOptions {
            persist_every: Some(1),
            output_path: Some(output.clone()),
            ..BatchOptions::default()
        };
        let pipeline = BatchPipeline::new(&template, &RuleTable::default(), options).unwrap();
        let mut table = OutputTable::open_or_create(&output).unwrap();
        pipeline.run(&d.source, &d.dest, &mut table, &mut SilentObserver).unwrap();

        assert_eq!(OutputTable::open_or_create(&output).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_checkpoint_keeps_batch_going() {
        let d = dirs();
        write_form(&d.source, "a.pdf", "A1", "1 00");
        write_form(&d.source, "b.pdf", "B2", "2 00");
        // A file where the output directory should be makes every persist fail.
        let blocker = d.source.parent().unwrap().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let template = Template::from_json(ONE_PAGE).unwrap();
        let options = BatchOptions {
            persist_every: Some(1),
            output_path: Some(blocker.join("data.csv")),
            ..BatchOptions::default()
        };
        let pipeline = BatchPipeline::new(&template, &RuleTable::default(), options).unwrap();
        let mut table = OutputTable::new();
        let report = pipeline.run(&d.source, &d.dest, &mut table, &mut SilentObserver).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(table.data_rows().len(), 2);
        assert!(d.dest.join("b.pdf").exists());
    }

    #[test]
    fn test_copy_fallback_removes_copy_when_source_stays() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.pdf");
        let to = dir.path().join("moved.pdf");
        fs::write(&from, b"%PDF").unwrap();

        let err = copy_then_remove(&from, &to, |_| {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"))
        })
        .unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
        assert!(from.exists());
        assert!(!to.exists());
    }

    #[test]
    fn test_copy_fallback_moves_file() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.pdf");
        let to = dir.path().join("moved.pdf");
        fs::write(&from, b"%PDF").unwrap();

        copy_then_remove(&from, &to, |p| fs::remove_file(p)).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"%PDF");
    }

    #[test]
    fn test_timestamped_subfolder() {
        let d = dirs();
        write_form(&d.source, "a.pdf", "A1", "1 00");

        let template = Template::from_json(ONE_PAGE).unwrap();
        let options = BatchOptions {
            timestamped_subfolder: true,
            ..BatchOptions::default()
        };
        let pipeline = BatchPipeline::new(&template, &RuleTable::default(), options).unwrap();
        let report = pipeline
            .run(&d.source, &d.dest, &mut OutputTable::new(), &mut SilentObserver)
            .unwrap();

        let DocumentStatus::Processed { location, .. } = &report.outcomes[0].status else {
            panic!("expected a processed document");
        };
        let subfolder = location.parent().unwrap();
        assert_eq!(subfolder.parent().unwrap(), d.dest);
        assert_eq!(subfolder.file_name().unwrap().len(), "20240101_120000".len());
    }

    #[test]
    fn test_normalize_file_name() {
        assert_eq!(normalize_file_name("turn in form 7.pdf"), "turn_in_form_7.pdf");
    }
}
