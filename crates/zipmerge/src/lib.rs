//! Merge several zip archives into one, keeping a single copy of each distinct file.
//!
//! A run extracts every input into a scratch area, folds the extracted trees into the
//! first one while skipping content already seen, and compresses the result into a
//! new archive.
//!
//! # Example
//!
//! ```no_run
//! use zipmerge::{CompressionLevel, PipelineConfig, PipelineOutcome};
//!
//! let config = PipelineConfig::new(["base.zip", "patch.zip"])
//!     .output("combined.zip")
//!     .level(CompressionLevel::SmallestSize);
//!
//! match zipmerge::run(config) {
//!     PipelineOutcome::Success(report) => println!("wrote {}", report.output.display()),
//!     PipelineOutcome::Failed { faults } => {
//!         for record in &faults {
//!             eprintln!("{}", record.status_line());
//!         }
//!     }
//! }
//! ```

pub use fault::{Fault, FaultRecord};
pub use pipeline::{
    DEFAULT_OUTPUT_NAME, MergePipeline, PipelineConfig, PipelineOutcome, RunReport, run,
};
pub use progress::{MergeProgress, Meter, Observer, Phase, ProgressHandle};
pub use source::{ImportQueue, ImportSource};

pub use zipmerge_archive::CompressionLevel;
pub use zipmerge_fs::{CancelToken, DedupScope, LayoutPolicy, same_content};
pub use zipmerge_verify::HashAlgorithm;

mod fault;
mod pipeline;
mod progress;
mod source;
