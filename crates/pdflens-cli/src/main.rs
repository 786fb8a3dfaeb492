//! CLI application for reading PDFs and analyzing their images.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, images, inspect, read, serve};

/// pdflens - Extract text, images and image analysis from PDF documents
#[derive(Parser)]
#[command(name = "pdflens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text of each page
    ReadText(read::ReadTextArgs),

    /// Extract embedded images, optionally saving and analyzing them
    ExtractImages(images::ExtractImagesArgs),

    /// Extract page text merged with OCR text from images
    ReadWithOcr(read::ReadWithOcrArgs),

    /// Show document metadata and per-page statistics
    Info(inspect::InspectArgs),

    /// Classify pages by content and count text blocks
    Structure(inspect::InspectArgs),

    /// Answer JSON requests from stdin, one per line
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Logs go to stderr; stdout carries results only.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::ReadText(args) => read::run_text(args, config_path).await,
        Commands::ExtractImages(args) => images::run(args, config_path).await,
        Commands::ReadWithOcr(args) => read::run_ocr(args, config_path).await,
        Commands::Info(args) => inspect::run_info(args, config_path).await,
        Commands::Structure(args) => inspect::run_structure(args, config_path).await,
        Commands::Serve(args) => serve::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
