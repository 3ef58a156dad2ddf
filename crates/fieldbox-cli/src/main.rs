//! CLI application for template-driven PDF form extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, scan, template};

/// Fieldbox - pull named form fields out of batches of PDFs
#[derive(Parser)]
#[command(name = "fieldbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a template to every PDF in the source directory
    Scan(scan::ScanArgs),

    /// Preview the fields a template extracts from one PDF
    Extract(extract::ExtractArgs),

    /// Author and inspect templates
    Template(template::TemplateArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Scan(args) => scan::run(args, config_path),
        Commands::Extract(args) => extract::run(args, config_path),
        Commands::Template(args) => template::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
