use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::fault::Fault;
use crate::progress::Phase;

/// An archive selected for merging. Two sources are the same when their paths are.
#[derive(Clone, Debug, Eq, Serialize)]
pub struct ImportSource {
    path: PathBuf,
    name: String,
}

impl ImportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// File name for display.
    pub fn name(&self) -> &str { &self.name }
}

impl PartialEq for ImportSource {
    fn eq(&self, other: &Self) -> bool { self.path == other.path }
}

/// Ordered list of archives waiting to be merged. The first one is the merge base.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ImportQueue {
    sources: Vec<ImportSource>,
}

impl ImportQueue {
    pub fn new() -> Self { Self::default() }

    /// Queue `path`. A path that does not exist is rejected and nothing is queued.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> Result<&ImportSource, Fault> {
        let source = ImportSource::new(path);
        if !source.path.exists() {
            warn!(path = %source.path.display(), "{}", Phase::Idle.status_line("Path does not exist"));
            return Err(Fault::NotFound { path: source.path });
        }

        info!(path = %source.path.display(), "{}", Phase::Idle.status_line("Added path"));
        self.sources.push(source);
        Ok(&self.sources[self.sources.len() - 1])
    }

    /// Remove the first queued source with this path.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<ImportSource> {
        let path = path.as_ref();
        let index = self.sources.iter().position(|s| s.path == path)?;
        Some(self.sources.remove(index))
    }

    pub fn clear(&mut self) { self.sources.clear(); }

    pub fn len(&self) -> usize { self.sources.len() }

    pub fn is_empty(&self) -> bool { self.sources.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &ImportSource> { self.sources.iter() }

    pub fn paths(&self) -> Vec<PathBuf> { self.sources.iter().map(|s| s.path.clone()).collect() }
}

impl<'a> IntoIterator for &'a ImportQueue {
    type Item = &'a ImportSource;
    type IntoIter = std::slice::Iter<'a, ImportSource>;

    fn into_iter(self) -> Self::IntoIter { self.sources.iter() }
}
