//! info and structure commands.

use clap::Args;

use pdflens_core::{Operation, Request};

use super::output::OutputArgs;
use super::{SourceArgs, run_request};

/// Arguments shared by the whole-document commands.
#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run_info(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let request = args.source.apply(Request::new(Operation::GetInfo));
    run_request(request, config_path, &args.output).await
}

pub async fn run_structure(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let request = args.source.apply(Request::new(Operation::AnalyzeStructure));
    run_request(request, config_path, &args.output).await
}
