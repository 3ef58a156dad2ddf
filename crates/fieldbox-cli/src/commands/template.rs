//! Template command - author and inspect field box templates.
//!
//! Every mutating subcommand loads the template, applies one edit and saves
//! it back. Templates are only written by these explicit saves.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use fieldbox_core::batch::{BatchOptions, BatchPipeline};
use fieldbox_core::models::{DisplayScale, PageIndex, Rect};
use fieldbox_core::{PdfDocument, RuleTable, Template, TextSource};

use super::{load_config, resolve_template};

/// Arguments for the template command.
#[derive(Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    command: TemplateCommand,
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List the field boxes of a template
    Show {
        /// Template file
        file: PathBuf,
    },

    /// Add a field box, creating the template if needed
    Add(AddArgs),

    /// Remove the most recently added box on a page
    RemoveLast {
        /// Template file
        file: PathBuf,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Remove every box on a page
    Clear {
        /// Template file
        file: PathBuf,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Check a template, optionally against rules and a sample PDF
    Validate(ValidateArgs),
}

#[derive(Args)]
struct AddArgs {
    /// Template file
    file: PathBuf,

    /// Field name (column header)
    #[arg(short, long)]
    name: String,

    /// Rectangle as x1,y1,x2,y2
    #[arg(short, long, value_parser = parse_coords, allow_hyphen_values = true)]
    rect: [f64; 4],

    /// Page number (1-based)
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Display size WxH the rectangle was drawn at; scaled to the page of --pdf
    #[arg(long, value_parser = parse_size, requires = "pdf")]
    display: Option<(f64, f64)>,

    /// Sample PDF giving the page size for --display
    #[arg(long)]
    pdf: Option<PathBuf>,
}

#[derive(Args)]
struct ValidateArgs {
    /// Template file
    file: PathBuf,

    /// Field rules file to bind against the template
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Built-in rule table to bind against the template
    #[arg(long, conflicts_with = "rules")]
    preset: Option<String>,

    /// Sample PDF to dry-run the template on
    #[arg(long)]
    pdf: Option<PathBuf>,
}

pub fn run(args: TemplateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        TemplateCommand::Show { file } => show_template(&file, config_path),
        TemplateCommand::Add(add_args) => add_field(add_args),
        TemplateCommand::RemoveLast { file, page } => remove_last(&file, page),
        TemplateCommand::Clear { file, page } => clear_page(&file, page),
        TemplateCommand::Validate(validate_args) => validate(validate_args, config_path),
    }
}

fn page_arg(page: u32) -> anyhow::Result<PageIndex> {
    PageIndex::new(page).ok_or_else(|| anyhow::anyhow!("Pages start at 1"))
}

fn parse_coords(s: &str) -> Result<[f64; 4], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{:?}: {}", v, e)))
        .collect::<Result<_, _>>()?;
    values
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected 4 comma-separated numbers, got {}", values.len()))
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {:?}", s))?;
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("{:?}: {}", v, e));
    Ok((parse(w)?, parse(h)?))
}

fn load_or_new(path: &Path) -> anyhow::Result<Template> {
    if path.exists() {
        Ok(Template::load(path)?)
    } else {
        Ok(Template::new())
    }
}

fn show_template(file: &Path, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let template = Template::load(&resolve_template(file, &config.paths.templates))?;

    if template.is_empty() {
        println!("{} Template has no field boxes.", style("ℹ").blue());
        return Ok(());
    }

    for page in template.pages() {
        println!("{}", style(format!("Page {}", page)).bold());
        for field in template.fields(page) {
            let [x1, y1, x2, y2] = field.rect.coords();
            println!("  {:<24} [{}, {}, {}, {}]", field.name, x1, y1, x2, y2);
        }
    }
    println!();
    println!(
        "{} field(s) on {} page(s)",
        template.field_count(),
        template.page_count()
    );

    Ok(())
}

fn add_field(args: AddArgs) -> anyhow::Result<()> {
    let page = page_arg(args.page)?;
    let mut template = load_or_new(&args.file)?;

    let coords = match (args.display, &args.pdf) {
        (Some(display), Some(pdf)) => {
            let doc = PdfDocument::open(pdf)?;
            let scale = DisplayScale::new(display, doc.page_size(page)?)
                .ok_or_else(|| anyhow::anyhow!("Display size must be positive"))?;
            // A degenerate rectangle is passed through so add_field reports it.
            Rect::from_coords(args.rect)
                .map(|rect| scale.to_document(rect).coords())
                .unwrap_or(args.rect)
        }
        _ => args.rect,
    };

    let field = template.add_field(page, args.name, coords)?;
    let [x1, y1, x2, y2] = field.rect.coords();
    println!(
        "{} Added {} on page {} at [{}, {}, {}, {}]",
        style("✓").green(),
        field.name,
        page,
        x1,
        y1,
        x2,
        y2
    );

    template.save(&args.file)?;
    Ok(())
}

fn remove_last(file: &Path, page: u32) -> anyhow::Result<()> {
    let page = page_arg(page)?;
    let mut template = Template::load(file)?;

    match template.remove_last_field(page) {
        Some(field) => println!(
            "{} Removed {} from page {}",
            style("✓").green(),
            field.name,
            page
        ),
        None => println!("{} Page {} has no field boxes", style("ℹ").blue(), page),
    }

    template.prune_empty_pages();
    template.save(file)?;
    Ok(())
}

fn clear_page(file: &Path, page: u32) -> anyhow::Result<()> {
    let page = page_arg(page)?;
    let mut template = Template::load(file)?;

    let count = template.fields(page).len();
    template.clear_page(page);
    template.prune_empty_pages();
    template.save(file)?;

    println!(
        "{} Cleared {} field box(es) from page {}",
        style("✓").green(),
        count,
        page
    );
    Ok(())
}

fn validate(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let template = Template::load(&resolve_template(&args.file, &config.paths.templates))?;

    let rules = match (&args.rules, &args.preset) {
        (Some(path), _) => RuleTable::from_file(path)?,
        (None, Some(name)) => RuleTable::preset(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown preset {:?}", name))?,
        (None, None) => config.rules.clone(),
    };

    let pipeline = BatchPipeline::new(&template, &rules, BatchOptions::from_config(&config))?;
    println!(
        "{} {} field(s) on {} page(s), {:?}, {} rule(s) bound",
        style("✓").green(),
        template.field_count(),
        template.page_count(),
        pipeline.layout(),
        rules.len()
    );

    if let Some(pdf) = &args.pdf {
        let doc = PdfDocument::open(pdf)?;
        let rows = pipeline.process_document(&doc)?;
        println!(
            "{} {} ({} page(s)) yields {} row(s)",
            style("✓").green(),
            pdf.display(),
            doc.page_count(),
            rows.len()
        );
        for row in &rows {
            for cell in &row.cells {
                println!("  {} = {}", cell.name, cell.value);
            }
        }
    }

    Ok(())
}
