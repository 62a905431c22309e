//! Filesystem primitives for merging extracted archive trees.
//!
//! # Architecture
//!
//! - `walk.rs` - Deterministic recursive file enumeration
//! - `layout.rs` - How a file's path is named inside a merge target or archive
//! - `merge.rs` - Content-deduplicating directory merge
//! - `compare.rs` - Directory equivalence by content
//! - `scratch.rs` - Temporary extraction area removed on discard or drop
//! - `progress.rs` / `cancel.rs` - Shared unit progress and cancellation

pub use cancel::CancelToken;
pub use compare::{content_set, same_content};
pub use error::{Error, Result};
pub use layout::LayoutPolicy;
pub use merge::{DedupScope, DirectoryMerger, FileFault, MergeOptions, MergeReport, SourceReport, merge};
pub use progress::{Progress, ProgressFn, UnitCounter};
pub use scratch::ScratchArea;
pub use walk::list_files;

mod cancel;
mod compare;
mod error;
mod layout;
mod merge;
mod progress;
mod scratch;
mod walk;
