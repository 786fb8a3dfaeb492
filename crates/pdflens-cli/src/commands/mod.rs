//! CLI commands.

pub mod config;
pub mod images;
pub mod inspect;
pub mod output;
pub mod read;
pub mod serve;

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use pdflens_core::{PdflensConfig, RangeRequest, Request, Response, Service};

use output::OutputArgs;

/// Where the PDF comes from: a positional path or `--url`.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Local PDF file
    file: Option<PathBuf>,

    /// Download the PDF from this URL instead
    #[arg(long)]
    url: Option<String>,
}

impl SourceArgs {
    /// Copy the source into a request. Both or neither are left for the
    /// service to reject.
    pub fn apply(&self, mut request: Request) -> Request {
        request.file_path = self.file.as_ref().map(|p| p.display().to_string());
        request.url = self.url.clone();
        request
    }
}

/// Optional page range.
#[derive(Args, Debug)]
pub struct RangeArgs {
    /// First page (1-indexed)
    #[arg(long)]
    start: Option<i64>,

    /// Last page (inclusive)
    #[arg(long)]
    end: Option<i64>,
}

impl RangeArgs {
    pub fn to_request(&self) -> Option<RangeRequest> {
        if self.start.is_none() && self.end.is_none() {
            None
        } else {
            Some(RangeRequest {
                start: self.start,
                end: self.end,
            })
        }
    }
}

/// Run one request on a blocking thread and print the response.
pub async fn run_request(
    request: Request,
    config_path: Option<&str>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let config = config::load_config(config_path)?;
    let operation = request.operation;

    let pb = spinner(format!("Running {}...", operation));
    let response = tokio::task::spawn_blocking(move || handle_blocking(config, &request)).await?;
    pb.finish_and_clear();

    output::emit(&response, output)?;

    match &response {
        Response::Success { warnings, .. } => {
            if !warnings.is_empty() {
                eprintln!(
                    "{} {} completed with {} warning(s)",
                    style("⚠").yellow(),
                    operation,
                    warnings.len()
                );
            }
            Ok(())
        }
        Response::Failure { error, .. } => anyhow::bail!("{}", error.message),
    }
}

/// Build a service and handle one request. Must not run on the async runtime.
fn handle_blocking(config: PdflensConfig, request: &Request) -> Response {
    match Service::builder().with_config(config).build() {
        Ok(service) => service.handle(request),
        Err(e) => {
            debug!("Failed to build service: {}", e);
            Response::failure(Some(request), &e)
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(template);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
