//! Serve command - answer JSON requests line by line.
//!
//! Each stdin line is one request object; each response envelope is written
//! to stdout as one line. Requests are handled strictly one after another.

use std::io::{self, BufRead, Write};

use clap::Args;
use tracing::{debug, info};

use pdflens_core::{Response, Service};

use super::config::load_config;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Stop after this many requests
    #[arg(long)]
    max_requests: Option<usize>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let service = Service::builder().with_config(config).build()?;
        info!("Serving requests from stdin");

        let stdin = io::stdin();
        let mut stdout = io::stdout().lock();
        serve_lines(&service, stdin.lock(), &mut stdout, args.max_requests)
    })
    .await?
}

fn serve_lines(
    service: &Service,
    input: impl BufRead,
    output: &mut impl Write,
    max_requests: Option<usize>,
) -> anyhow::Result<()> {
    let mut handled = 0;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response: Response = service.handle_json(&line);
        debug!("Request {} success={}", handled + 1, response.is_success());
        serde_json::to_writer(&mut *output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;

        handled += 1;
        if max_requests.is_some_and(|max| handled >= max) {
            break;
        }
    }

    info!("Handled {} requests", handled);
    Ok(())
}
