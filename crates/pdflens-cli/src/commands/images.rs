//! extract-images command.

use std::path::PathBuf;

use clap::Args;

use pdflens_core::{Operation, Request};

use super::output::OutputArgs;
use super::{RangeArgs, SourceArgs, run_request};

/// Arguments for the extract-images command.
#[derive(Args)]
pub struct ExtractImagesArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    range: RangeArgs,

    /// Write extracted images to this directory
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Skip OCR and captioning; only list (and optionally save) images
    #[arg(long)]
    no_analyze: bool,

    /// Do not caption images with the vision model
    #[arg(long, conflicts_with = "vision")]
    no_vision: bool,

    /// Caption images even if the config disables it by default
    #[arg(long)]
    vision: bool,

    /// OCR language, e.g. "eng" or "eng+fra" (default from config)
    #[arg(short, long)]
    language: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run(args: ExtractImagesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut request = args.source.apply(Request::new(Operation::ExtractImages));
    request.page_range = args.range.to_request();
    request.output_dir = args.output_dir;
    request.analyze_images = Some(!args.no_analyze);
    request.use_vision_model = match (args.vision, args.no_vision) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    request.ocr_language = args.language;
    run_request(request, config_path, &args.output).await
}
