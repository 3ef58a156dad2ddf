//! Scan command - run the batch pipeline over the source directory.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use fieldbox_core::batch::{
    BatchObserver, BatchOptions, BatchPipeline, DocumentOutcome, DocumentStatus,
};
use fieldbox_core::models::config::LayoutMode;
use fieldbox_core::{OutputTable, RuleTable, Template};

use super::{load_config, resolve_template};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Template file (JSON), looked up in the templates directory if not found
    #[arg(short, long, required = true)]
    template: PathBuf,

    /// Directory with documents to process
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Destination for processed documents
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Field rules file (JSON list of {field, rule})
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Built-in rule table (disposal-form, none)
    #[arg(long, conflicts_with = "rules")]
    preset: Option<String>,

    /// Output table (CSV)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave processed documents in the source directory
    #[arg(long)]
    keep_files: bool,

    /// Persist the output table every N processed documents
    #[arg(long)]
    persist_every: Option<usize>,

    /// How documents map onto template pages
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Write plain file names instead of hyperlinks
    #[arg(long)]
    no_links: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LayoutArg {
    /// Repeat for one-page templates, span otherwise
    Auto,
    /// Apply the first template page to every document page
    Repeat,
    /// One row per document across all template pages
    Span,
}

impl From<LayoutArg> for LayoutMode {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Auto => LayoutMode::Auto,
            LayoutArg::Repeat => LayoutMode::Repeat,
            LayoutArg::Span => LayoutMode::Span,
        }
    }
}

/// Prints per-document commentary above a progress bar.
struct ProgressObserver {
    bar: ProgressBar,
}

impl BatchObserver for ProgressObserver {
    fn discovered(&mut self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn finished(&mut self, outcome: &DocumentOutcome) {
        let line = match &outcome.status {
            DocumentStatus::Processed { rows, location } => format!(
                "{} {} -> {} ({} row(s))",
                style("✓").green(),
                outcome.file_name,
                location.display(),
                rows
            ),
            DocumentStatus::Failed { reason } => {
                format!("{} {}: {}", style("✗").red(), outcome.file_name, reason)
            }
            DocumentStatus::Skipped { reason } => {
                format!("{} {} skipped ({})", style("ℹ").blue(), outcome.file_name, reason)
            }
        };
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
        self.bar.inc(1);
    }
}

pub fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let workspace = config.workspace(args.source.clone(), args.dest.clone());
    workspace.ensure()?;

    let template_path = resolve_template(&args.template, &workspace.templates);
    let template = Template::load(&template_path)?;

    let rules = match (&args.rules, &args.preset) {
        (Some(path), _) => RuleTable::from_file(path)?,
        (None, Some(name)) => RuleTable::preset(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown preset {:?}, expected one of: {}",
                name,
                RuleTable::preset_names().join(", ")
            )
        })?,
        (None, None) => config.rules.clone(),
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.paths.output_in(&workspace.scanned));

    let mut options = BatchOptions::from_config(&config);
    options.relocate = config.batch.relocate && !args.keep_files;
    options.output_path = Some(output.clone());
    if let Some(every) = args.persist_every {
        options.persist_every = Some(every);
    }
    if let Some(layout) = args.layout {
        options.layout = layout.into();
    }

    let pipeline = BatchPipeline::new(&template, &rules, options)?;
    debug!("Columns: {}", pipeline.header().join(", "));

    let mut table = OutputTable::open_or_create(&output)?
        .with_hyperlinks(config.output.hyperlinks && !args.no_links);

    println!(
        "{} Template {} ({} field(s), {:?})",
        style("ℹ").blue(),
        template_path.display(),
        template.field_count(),
        pipeline.layout()
    );

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entries")?
            .progress_chars("=>-"),
    );
    let mut observer = ProgressObserver { bar };

    let report = pipeline.run(&workspace.to_scan, &workspace.scanned, &mut table, &mut observer)?;
    observer.bar.finish_and_clear();

    table.persist(&output)?;

    // Print summary
    println!();
    println!(
        "{} Scanned {} in {:?}",
        style("✓").green(),
        workspace.to_scan.display(),
        start.elapsed()
    );
    println!(
        "   {} processed, {} failed, {} skipped, {} row(s) written to {}",
        style(report.processed).green(),
        style(report.failed).red(),
        report.skipped,
        report.rows_appended,
        output.display()
    );

    if report.failed > 0 {
        println!();
        println!("{}", style("Failed files:").red());
        for name in report.failed_files() {
            println!("  - {}", name);
        }
        if let Some(log) = &report.failure_log {
            println!("Logged to {}", log.display());
        }
    }

    Ok(())
}
