//! `vidhub-cli`: offline administration of installed extensions.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

#[tokio::main]
async fn main() -> ExitCode {
    // Quiet by default; the CLI reports outcomes itself.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match commands::Cli::parse().execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{} ({})", e.message, e.kind));
            ExitCode::FAILURE
        }
    }
}
