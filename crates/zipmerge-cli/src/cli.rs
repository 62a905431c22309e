use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use zipmerge::{CompressionLevel, DedupScope, HashAlgorithm, ImportQueue, LayoutPolicy, PipelineConfig};

#[derive(Clone, Debug, Parser)]
#[command(name = "zipmerge", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Archives to merge. The first one is the merge base.
    #[arg(required_unless_present = "list_levels")]
    pub inputs: Vec<PathBuf>,

    /// Output archive [default: merged.zip next to the first input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// stored, fastest, optimal, smallest, or a deflate level 0-9
    #[arg(short, long, default_value = "optimal")]
    pub level: CompressionLevel,

    /// per-source or global
    #[arg(long, default_value = "per-source")]
    pub dedup: DedupScope,

    /// flatten or preserve
    #[arg(long, default_value = "flatten")]
    pub layout: LayoutPolicy,

    /// Content fingerprint algorithm
    #[arg(long, default_value = "blake3")]
    pub hash: HashAlgorithm,

    /// Directory to create the scratch area in
    #[arg(long)]
    pub scratch: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// List the named compression levels and exit
    #[arg(long)]
    pub list_levels: bool,
}

impl Cli {
    /// Queue the inputs and turn the arguments into a pipeline configuration.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut queue = ImportQueue::new();
        for input in &self.inputs {
            queue
                .add(input)
                .with_context(|| format!("cannot queue '{}'", input.display()))?;
        }

        let mut config = PipelineConfig::from_queue(&queue)
            .level(self.level)
            .dedup_scope(self.dedup)
            .layout(self.layout)
            .algorithm(self.hash);
        if let Some(output) = &self.output {
            config = config.output(output);
        }
        if let Some(scratch) = &self.scratch {
            config = config.scratch_dir(scratch);
        }
        Ok(config)
    }
}
