mod cli;
mod progress;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use counter_engine::Engine;
use engine_logging::{engine_error, engine_info};

use crate::cli::Cli;
use crate::progress::LogProgressSink;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_destination(), cli.log_level());

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let engine = Engine::new(cli.fetch_settings()).context("could not build HTTP client")?;
    let config = cli.run_config();
    let sink = LogProgressSink::new();

    let report = engine
        .run(&config, &sink)
        .await
        .with_context(|| format!("counting components at {}", config.base_url))?;
    engine_info!(
        "Wrote {} repositories to {}",
        report.completed.len(),
        config.output_path().display()
    );
    Ok(())
}
