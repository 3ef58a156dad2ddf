//! Configuration structures for the extraction pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rows::RuleTable;

/// Main configuration for fieldbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldboxConfig {
    /// Directory and file locations.
    pub paths: PathsConfig,

    /// Batch pipeline behaviour.
    pub batch: BatchConfig,

    /// Output table rendering.
    pub output: OutputConfig,

    /// Field rules applied when building rows.
    pub rules: RuleTable,
}

/// Directory contract: where documents come from and go to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source directory drained by the batch.
    pub to_scan: PathBuf,

    /// Destination for processed documents.
    pub scanned: PathBuf,

    /// Directory holding template files.
    pub templates: PathBuf,

    /// Output table artifact; `scanned_data.csv` in the destination when unset.
    pub output_file: Option<PathBuf>,

    /// Failure log file name, created inside the source directory.
    pub failure_log: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            to_scan: PathBuf::from("To Scan"),
            scanned: PathBuf::from("Scanned"),
            templates: PathBuf::from("Form Templates"),
            output_file: None,
            failure_log: "_failed_files.log".to_string(),
        }
    }
}

/// File name of the output table inside the destination directory.
pub const DEFAULT_OUTPUT_FILE: &str = "scanned_data.csv";

impl PathsConfig {
    /// The output table for a run relocating into `scanned`.
    pub fn output_in(&self, scanned: &Path) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| scanned.join(DEFAULT_OUTPUT_FILE))
    }
}

/// How multi-page documents map onto the template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Repeat for single-page templates, span for multi-page templates.
    #[default]
    Auto,
    /// Every document page is its own form instance.
    Repeat,
    /// The template pages together describe one multi-page form.
    Span,
}

/// Batch pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Move processed documents to the destination directory.
    pub relocate: bool,

    /// Persist the output table every N processed documents.
    pub persist_every: Option<usize>,

    /// Relocate into a per-run `YYYYmmdd_HHMMSS` subfolder of the destination.
    pub timestamped_subfolder: bool,

    /// Page layout of the documents.
    pub layout: LayoutMode,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            relocate: true,
            persist_every: None,
            timestamped_subfolder: false,
            layout: LayoutMode::Auto,
        }
    }
}

/// Output table configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Render the filename column as a spreadsheet hyperlink.
    pub hyperlinks: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { hyperlinks: true }
    }
}

impl FieldboxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        fs::write(path, content)
    }

    /// The directory layout described by this configuration, with the
    /// source and destination optionally overridden.
    pub fn workspace(&self, to_scan: Option<PathBuf>, scanned: Option<PathBuf>) -> Workspace {
        Workspace {
            to_scan: to_scan.unwrap_or_else(|| self.paths.to_scan.clone()),
            scanned: scanned.unwrap_or_else(|| self.paths.scanned.clone()),
            templates: self.paths.templates.clone(),
        }
    }
}

/// The three directories a batch run works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Source directory, drained by relocation.
    pub to_scan: PathBuf,
    /// Destination for processed documents and the output table.
    pub scanned: PathBuf,
    /// Read-only source of template files.
    pub templates: PathBuf,
}

impl Workspace {
    /// Create any of the directories that do not exist yet.
    pub fn ensure(&self) -> Result<(), std::io::Error> {
        for dir in [&self.to_scan, &self.scanned, &self.templates] {
            if !dir.is_dir() {
                fs::create_dir_all(dir)?;
                debug!("Created directory {}", dir.display());
            }
        }
        Ok(())
    }
}
