use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use invoice_subject::Session;
use invoice_subject::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("invoice_subject=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let session = Session::new(&cli.training_data, &cli.test_data, cli.classifier_params());

    let outcome = session
        .run(io::stdin().lock(), io::stdout().lock())
        .with_context(|| format!("session on '{}' failed", session.training_path().display()))?;

    tracing::info!(corrections = outcome.corrections, "session finished");
    Ok(())
}
