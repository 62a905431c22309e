//! Recompression of a directory tree into a single zip archive.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;
use zipmerge_fs::{UnitCounter, list_files};
use zipmerge_verify::{Fingerprint, HashAlgorithm, HashingReader};

use crate::error::{Error, Result};
use crate::options::{CompressOptions, CompressionLevel};

#[derive(Clone, Debug, Serialize)]
pub struct CompressedEntry {
    pub name: String,
    pub source: PathBuf,
    pub size: u64,
    pub fingerprint: Fingerprint,
}

/// A file left out of the archive. Compression carried on without it.
#[derive(Clone, Debug, Serialize)]
pub struct EntryFault {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompressionReport {
    pub output: PathBuf,
    pub level: CompressionLevel,
    pub entries: Vec<CompressedEntry>,
    pub faults: Vec<EntryFault>,
}

impl CompressionReport {
    pub fn total_bytes(&self) -> u64 { self.entries.iter().map(|e| e.size).sum() }
}

/// Write every file under `source_dir` into a new archive at `output`.
///
/// The level is validated before anything is touched. The archive is staged in a
/// temporary file beside `output` and moves into place only once it is finished, so a
/// failed or cancelled run leaves any existing file at `output` untouched. Failing to
/// create, finish or persist the archive is fatal. A file that cannot be added is
/// recorded in the report and skipped, as is a second file whose entry name collides
/// with one already written.
pub fn compress(
    source_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &CompressOptions,
) -> Result<CompressionReport> {
    let source_dir = source_dir.as_ref();
    let output = output.as_ref();
    let level = options.level.validate()?;

    let files = list_files(source_dir)?;
    options.check_cancelled()?;

    info!(
        source = %source_dir.display(),
        output = %output.display(),
        files = files.len(),
        %level,
        "compressing folder"
    );

    let create_failed = |e: io::Error| Error::CreateArchive {
        path: output.to_path_buf(),
        source: e,
    };
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(create_failed)?;
    let staged = tempfile::Builder::new()
        .prefix(".zipmerge-")
        .suffix(".zip.tmp")
        .tempfile_in(parent)
        .map_err(create_failed)?;
    let mut writer = ZipWriter::new(BufWriter::new(staged));
    let file_options = level.file_options();

    let mut counter = UnitCounter::start(options.on_progress.as_ref(), files.len() as u64);
    let mut names = HashSet::new();
    let mut entries = Vec::with_capacity(files.len());
    let mut faults = Vec::new();

    for path in files {
        options.check_cancelled()?;

        let outcome = match options.layout.entry_name(source_dir, &path) {
            None => Err(Error::EntryFailed {
                path: path.clone(),
                reason: "no valid entry name".to_string(),
            }),
            Some(name) if names.contains(&name) => Err(Error::EntryFailed {
                path: path.clone(),
                reason: format!("entry name '{name}' already written"),
            }),
            Some(name) => add_file(&mut writer, &path, name, file_options, options.algorithm),
        };

        match outcome {
            Ok(entry) => {
                debug!(entry = %entry.name, size = entry.size, "added");
                names.insert(entry.name.clone());
                entries.push(entry);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                faults.push(EntryFault {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
        counter.step(&path);
    }

    let buffered = writer.finish().map_err(|e| Error::FinishArchive {
        path: output.to_path_buf(),
        source: e,
    })?;
    let staged = buffered.into_inner().map_err(|e| create_failed(e.into_error()))?;
    staged.persist(output).map_err(|e| create_failed(e.error))?;

    info!(
        output = %output.display(),
        entries = entries.len(),
        faults = faults.len(),
        "compressed folder"
    );

    Ok(CompressionReport {
        output: output.to_path_buf(),
        level,
        entries,
        faults,
    })
}

fn add_file<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    path: &Path,
    name: String,
    file_options: SimpleFileOptions,
    algorithm: HashAlgorithm,
) -> Result<CompressedEntry> {
    let failed = |reason: String| Error::EntryFailed {
        path: path.to_path_buf(),
        reason,
    };

    // Open before starting the entry, so an unreadable file leaves no trace in the archive.
    let file = File::open(path).map_err(|e| failed(e.to_string()))?;
    let size = file.metadata().map_err(|e| failed(e.to_string()))?.len();

    writer
        .start_file(name.as_str(), file_options.large_file(size >= u32::MAX as u64))
        .map_err(|e| failed(e.to_string()))?;

    let mut reader = HashingReader::new(file, algorithm.hasher());
    if let Err(e) = io::copy(&mut reader, writer) {
        if let Err(abort) = writer.abort_file() {
            warn!(path = %path.display(), error = %abort, "failed to discard partial entry");
        }
        return Err(failed(e.to_string()));
    }

    Ok(CompressedEntry {
        name,
        source: path.to_path_buf(),
        size: reader.bytes_read(),
        fingerprint: reader.finish(),
    })
}
