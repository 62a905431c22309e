//! Streaming extraction of archive entries into a destination directory.
//!
//! Entries are pulled one at a time from an [`EntrySource`], sanitized against the
//! destination, and written in archive order. The first entry that cannot be resolved
//! or written aborts the extraction; entries already written stay on disk.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::{debug, info};
use zipmerge_fs::UnitCounter;
use zipmerge_verify::HashingReader;

use crate::entry::{Entry, EntryKind, ExtractionReport};
use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::sanitize::sanitize_entry_path;

mod zip;

pub use self::zip::ZipSource;

/// An entry read from an archive but not yet written.
pub struct PendingEntry<R> {
    /// Raw entry name, slash separated.
    pub name: String,
    pub size: u64,
    pub kind: PendingKind<R>,
}

pub enum PendingKind<R> {
    Directory,
    File(R),
}

/// Archive-specific entry source.
///
/// Each returned entry borrows the source, so entries are consumed strictly one after
/// another.
pub trait EntrySource {
    type Reader<'a>: Read
    where
        Self: 'a;

    /// Number of entries, known before the first one is read.
    fn entry_count(&self) -> usize;

    fn next_entry(&mut self) -> Option<Result<PendingEntry<Self::Reader<'_>>>>;
}

/// Extraction results.
pub struct Extracted {
    pub entries: Vec<Entry>,
    pub total_bytes: u64,
}

/// Main extraction loop.
///
/// Publishes the entry count as the progress ceiling, then one unit per entry.
pub fn extract<S: EntrySource>(
    source: &mut S,
    destination: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<Extracted> {
    let destination = destination.as_ref();
    ensure_directory(destination)?;

    let mut counter = UnitCounter::start(options.on_progress.as_ref(), source.entry_count() as u64);
    let mut entries = Vec::with_capacity(source.entry_count());
    let mut total_bytes = 0u64;

    while let Some(pending) = source.next_entry() {
        options.check_cancelled()?;
        let pending = pending?;

        let sanitized = sanitize_entry_path(&pending.name, destination)?;
        let entry = match pending.kind {
            PendingKind::Directory => {
                ensure_directory(&sanitized.resolved)?;
                Entry::new(pending.name, sanitized.resolved, 0, EntryKind::Directory)
            }
            PendingKind::File(reader) => {
                if sanitized.relative.as_os_str().is_empty() {
                    return Err(Error::InvalidPath {
                        entry: pending.name,
                        base: destination.to_path_buf(),
                    });
                }
                let (written, fingerprint) = write_file(reader, &sanitized.resolved, options)?;
                total_bytes += written;
                let entry = Entry::new(pending.name, sanitized.resolved, written, EntryKind::File);
                match fingerprint {
                    Some(fp) => entry.with_fingerprint(fp),
                    None => entry,
                }
            }
        };

        debug!(entry = %entry.name, path = %entry.target_path.display(), size = entry.size, "extracted");
        counter.step(&entry.target_path);
        entries.push(entry);
    }

    Ok(Extracted { entries, total_bytes })
}

/// Extract the zip archive at `archive` into `destination`, creating it if needed.
pub fn extract_archive(
    archive: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    let archive = archive.as_ref();
    let destination = destination.as_ref();

    if !archive.is_file() {
        return Err(Error::NotFound { path: archive.to_path_buf() });
    }
    options.check_cancelled()?;

    let file = File::open(archive).map_err(|e| Error::Open {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let mut source = ZipSource::new(BufReader::new(file))?;

    info!(
        archive = %archive.display(),
        destination = %destination.display(),
        entries = source.entry_count(),
        "extracting archive"
    );

    let extracted = extract(&mut source, destination, options)?;

    info!(
        archive = %archive.display(),
        entries = extracted.entries.len(),
        bytes = extracted.total_bytes,
        "extracted archive"
    );

    Ok(ExtractionReport {
        archive: archive.to_path_buf(),
        destination: destination.to_path_buf(),
        total_bytes: extracted.total_bytes,
        entries: extracted.entries,
    })
}

fn write_file<R: Read>(
    reader: R,
    target_path: &Path,
    options: &ExtractOptions,
) -> Result<(u64, Option<zipmerge_verify::Fingerprint>)> {
    if let Some(parent) = target_path.parent() {
        ensure_directory(parent)?;
    }

    let failed = |e: io::Error| Error::ExtractionFailed {
        path: target_path.to_path_buf(),
        source: e,
    };
    let mut file = File::create(target_path).map_err(failed)?;

    match options.hash {
        Some(algorithm) => {
            let mut reader = HashingReader::new(reader, algorithm.hasher());
            let written = io::copy(&mut reader, &mut file).map_err(failed)?;
            Ok((written, Some(reader.finish())))
        }
        None => {
            let mut reader = reader;
            let written = io::copy(&mut reader, &mut file).map_err(failed)?;
            Ok((written, None))
        }
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
