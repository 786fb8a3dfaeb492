//! read-text and read-with-ocr commands.

use clap::Args;

use pdflens_core::{Operation, Request};

use super::output::OutputArgs;
use super::{RangeArgs, SourceArgs, run_request};

/// Arguments for the read-text command.
#[derive(Args)]
pub struct ReadTextArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    range: RangeArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run_text(args: ReadTextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut request = args.source.apply(Request::new(Operation::ReadText));
    request.page_range = args.range.to_request();
    run_request(request, config_path, &args.output).await
}

/// Arguments for the read-with-ocr command.
#[derive(Args)]
pub struct ReadWithOcrArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    range: RangeArgs,

    /// OCR language, e.g. "eng" or "eng+fra" (default from config)
    #[arg(short, long)]
    language: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run_ocr(args: ReadWithOcrArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut request = args.source.apply(Request::new(Operation::ReadWithOcr));
    request.page_range = args.range.to_request();
    request.ocr_language = args.language;
    run_request(request, config_path, &args.output).await
}
