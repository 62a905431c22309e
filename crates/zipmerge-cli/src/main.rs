use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use zipmerge::{CompressionLevel, MergePipeline, MergeProgress, PipelineOutcome};

use crate::cli::Cli;
use crate::progress::PassBar;

mod cli;
mod progress;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_levels {
        for level in CompressionLevel::all() {
            println!("{level}");
        }
        return Ok(());
    }

    let bar = Arc::new(PassBar::new());
    let observer_bar = Arc::clone(&bar);
    let config = cli
        .to_config()?
        .observer(Arc::new(move |p: &MergeProgress| observer_bar.update(p)));

    let outcome = MergePipeline::new(config).run();
    bar.finish();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    for record in outcome.faults() {
        eprintln!("{}", record.status_line());
    }

    match outcome {
        PipelineOutcome::Success(report) => {
            if !cli.json {
                println!("{}", report.output.display());
            }
            Ok(())
        }
        PipelineOutcome::Failed { .. } => bail!("merge failed"),
    }
}
