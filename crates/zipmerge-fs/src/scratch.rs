use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Error, Result};

const SCRATCH_PREFIX: &str = "zipmerge-";

/// Temporary area holding one extracted tree per input archive.
///
/// The area is removed by [`ScratchArea::discard`], or on drop if never discarded.
/// A process that dies mid-run leaves it behind.
pub struct ScratchArea {
    dir: TempDir,
    slots: Vec<PathBuf>,
}

impl ScratchArea {
    /// Create a scratch area under the system temp directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| Error::Write {
                path: std::env::temp_dir(),
                source: e,
            })?;
        Ok(Self { dir, slots: Vec::new() })
    }

    /// Create a scratch area under `parent`, creating `parent` if needed.
    pub fn new_in(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| Error::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        Ok(Self { dir, slots: Vec::new() })
    }

    pub fn path(&self) -> &Path { self.dir.path() }

    /// Reserve a dedicated subdirectory for the next input, named `NNN-<stem>`.
    ///
    /// The numeric prefix keeps slots distinct even when two inputs share a file name.
    pub fn allocate(&mut self, source: &Path) -> Result<PathBuf> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string());
        let slot = self.dir.path().join(format!("{:03}-{stem}", self.slots.len()));

        std::fs::create_dir_all(&slot).map_err(|e| Error::Write {
            path: slot.clone(),
            source: e,
        })?;
        self.slots.push(slot.clone());
        Ok(slot)
    }

    /// Slots in allocation order.
    pub fn slots(&self) -> &[PathBuf] { &self.slots }

    /// Remove the area and everything in it.
    pub fn discard(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| Error::Write { path, source: e })
    }
}
