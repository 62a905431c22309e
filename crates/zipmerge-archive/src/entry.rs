use std::path::PathBuf;

use serde::Serialize;
use zipmerge_verify::Fingerprint;

/// An archive entry written to disk during extraction.
#[derive(Clone, Debug, Serialize)]
pub struct Entry {
    /// Entry name as stored in the archive.
    pub name: String,
    pub target_path: PathBuf,
    pub size: u64,
    pub kind: EntryKind,
    pub fingerprint: Option<Fingerprint>,
}

impl Entry {
    pub fn new(name: impl Into<String>, target_path: PathBuf, size: u64, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            target_path,
            size,
            kind,
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn is_file(&self) -> bool { matches!(self.kind, EntryKind::File) }

    pub fn is_directory(&self) -> bool { matches!(self.kind, EntryKind::Directory) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExtractionReport {
    pub archive: PathBuf,
    pub destination: PathBuf,
    pub total_bytes: u64,
    pub entries: Vec<Entry>,
}

impl ExtractionReport {
    pub fn entry_count(&self) -> usize { self.entries.len() }

    pub fn file_count(&self) -> usize { self.entries.iter().filter(|e| e.is_file()).count() }

    pub fn fingerprints(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.entries.iter().filter_map(|e| e.fingerprint)
    }
}
