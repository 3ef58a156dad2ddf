//! Extract command - preview a template against a single PDF.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::warn;

use fieldbox_core::models::PageIndex;
use fieldbox_core::{ExtractedField, PdfDocument, Template, TextSource, extract};

use super::{load_config, resolve_template};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Template file (JSON)
    #[arg(short, long, required = true)]
    template: PathBuf,

    /// Only this page (1-based)
    #[arg(short, long)]
    page: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// `name = text` lines
    Text,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct PageFields {
    page: u32,
    fields: Vec<ExtractedField>,
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let template = Template::load(&resolve_template(&args.template, &config.paths.templates))?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let doc = PdfDocument::open(&args.input)?;

    let pages: Vec<PageIndex> = match args.page {
        Some(n) => vec![PageIndex::new(n).ok_or_else(|| anyhow::anyhow!("Pages start at 1"))?],
        None => template.pages().collect(),
    };

    let mut results = Vec::with_capacity(pages.len());
    for page in pages {
        // Without --page, template pages beyond the document are skipped.
        if args.page.is_none() && page.get() > doc.page_count() {
            warn!(
                "Template page {} is beyond the document's {} page(s), skipping",
                page,
                doc.page_count()
            );
            continue;
        }
        let fields = extract(&doc, &template, page)?;
        results.push(PageFields {
            page: page.get(),
            fields,
        });
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => {
            for result in &results {
                println!("{}", style(format!("Page {}", result.page)).bold());
                if result.fields.is_empty() {
                    println!("  (no fields on this page)");
                }
                for field in &result.fields {
                    println!("  {} = {}", field.name, field.text);
                }
            }
        }
    }

    Ok(())
}
