//! Content-deduplicating merge of several directories into one.
//!
//! The first source doubles as the accumulation target; every later source is folded
//! into it in order. Each file is fingerprinted and copied only if its content has
//! not been seen in the active [`DedupScope`]. Copies overwrite same-named files
//! already in the target, so across sources the last one folded wins a name clash.
//!
//! Under [`LayoutPolicy::Flatten`] the target itself is flattened first: every file
//! moves to the target root under its base name, and when two share a base name the
//! one enumerated later wins.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info, warn};
use zipmerge_verify::{Fingerprint, HashAlgorithm, fingerprint_file};

use crate::{CancelToken, Error, LayoutPolicy, ProgressFn, Result, UnitCounter, list_files};

/// Which files a fingerprint is compared against before copying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupScope {
    /// The set of seen fingerprints restarts with every source folded in.
    #[default]
    PerSource,
    /// One set for the whole merge, seeded with the target's own files.
    Global,
}

impl DedupScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerSource => "per-source",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for DedupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DedupScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "per-source" | "source" => Ok(Self::PerSource),
            "global" => Ok(Self::Global),
            _ => Err(Error::UnknownOption {
                kind: "dedup scope",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Default)]
pub struct MergeOptions {
    pub dedup_scope: DedupScope,
    pub layout: LayoutPolicy,
    pub algorithm: HashAlgorithm,
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancelToken>,
}

impl MergeOptions {
    pub fn dedup_scope(mut self, scope: DedupScope) -> Self {
        self.dedup_scope = scope;
        self
    }

    pub fn layout(mut self, layout: LayoutPolicy) -> Self {
        self.layout = layout;
        self
    }

    pub fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn on_progress(mut self, callback: ProgressFn) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A single file that could not be hashed or copied. The merge skipped it.
#[derive(Clone, Debug, Serialize)]
pub struct FileFault {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SourceReport {
    pub source: PathBuf,
    pub files_seen: usize,
    /// Destination paths written into the target.
    pub copied: Vec<PathBuf>,
    /// Source files skipped because their content was already seen.
    pub duplicates: Vec<PathBuf>,
    pub faults: Vec<FileFault>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MergeReport {
    pub target: PathBuf,
    pub sources: Vec<SourceReport>,
    /// Target files removed while flattening because a later file took their base name.
    pub displaced: Vec<PathBuf>,
    /// Files of the target itself that could not be flattened or fingerprinted.
    pub target_faults: Vec<FileFault>,
}

impl MergeReport {
    pub fn copied_count(&self) -> usize { self.sources.iter().map(|s| s.copied.len()).sum() }

    pub fn duplicate_count(&self) -> usize {
        self.sources.iter().map(|s| s.duplicates.len()).sum()
    }

    pub fn faults(&self) -> impl Iterator<Item = &FileFault> {
        self.target_faults
            .iter()
            .chain(self.sources.iter().flat_map(|s| s.faults.iter()))
    }
}

/// Folds source directories into a target one at a time.
///
/// Dedup state lives in the merger, so independent merges never share it.
pub struct DirectoryMerger {
    target: PathBuf,
    options: MergeOptions,
    seen: HashSet<Fingerprint>,
    report: MergeReport,
}

impl DirectoryMerger {
    pub fn new(target: impl Into<PathBuf>, options: MergeOptions) -> Result<Self> {
        let target = target.into();
        if !target.is_dir() {
            return Err(Error::NotFound { path: target });
        }

        let mut merger = Self {
            report: MergeReport {
                target: target.clone(),
                sources: Vec::new(),
                displaced: Vec::new(),
                target_faults: Vec::new(),
            },
            target,
            options,
            seen: HashSet::new(),
        };

        if merger.options.layout == LayoutPolicy::Flatten {
            merger.flatten_target()?;
        }
        if merger.options.dedup_scope == DedupScope::Global {
            merger.seed_from_target()?;
        }
        Ok(merger)
    }

    pub fn target(&self) -> &Path { &self.target }

    /// Everything folded so far.
    pub fn report(&self) -> &MergeReport { &self.report }

    fn seed_from_target(&mut self) -> Result<()> {
        for file in list_files(&self.target)? {
            match fingerprint_file(&file, self.options.algorithm) {
                Ok(fp) => {
                    self.seen.insert(fp);
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "cannot fingerprint target file");
                    self.report.target_faults.push(FileFault {
                        path: file,
                        reason: e.to_string(),
                    });
                }
            }
        }
        debug!(target = %self.target.display(), seeded = self.seen.len(), "seeded global dedup set");
        Ok(())
    }

    /// Move every nested target file to the target root under its base name.
    ///
    /// For each base name the last file in enumeration order survives; the others are
    /// removed. A file that cannot be moved or removed is recorded and left in place.
    fn flatten_target(&mut self) -> Result<()> {
        let files = list_files(&self.target)?;

        let mut winners: HashMap<OsString, &Path> = HashMap::new();
        for file in &files {
            if let Some(name) = file.file_name() {
                winners.insert(name.to_os_string(), file);
            }
        }

        let mut moved = 0usize;
        for file in &files {
            if let Some(token) = &self.options.cancel {
                token.check()?;
            }
            let Some(name) = file.file_name() else { continue };

            let result = if winners.get(name).copied() != Some(file.as_path()) {
                std::fs::remove_file(file).map(|()| {
                    debug!(path = %file.display(), "displaced by a later file of the same name");
                    self.report.displaced.push(file.clone());
                })
            } else {
                let dest = self.target.join(name);
                if dest == *file {
                    continue;
                }
                std::fs::rename(file, &dest).map(|()| moved += 1)
            };

            if let Err(e) = result {
                warn!(path = %file.display(), error = %e, "cannot flatten target file");
                self.report.target_faults.push(FileFault {
                    path: file.clone(),
                    reason: e.to_string(),
                });
            }
        }

        debug!(
            target = %self.target.display(),
            moved,
            displaced = self.report.displaced.len(),
            "flattened target"
        );
        Ok(())
    }

    /// Fold every file of `source` into the target.
    ///
    /// An unreadable `source` aborts the fold; a file that cannot be hashed or copied
    /// is recorded in the returned report and skipped.
    pub fn fold(&mut self, source: impl AsRef<Path>) -> Result<SourceReport> {
        let source = source.as_ref();
        let files = list_files(source)?;

        if self.options.dedup_scope == DedupScope::PerSource {
            self.seen.clear();
        }

        info!(
            source = %source.display(),
            target = %self.target.display(),
            files = files.len(),
            "merging folder"
        );

        let mut report = SourceReport {
            source: source.to_path_buf(),
            files_seen: files.len(),
            ..SourceReport::default()
        };
        let callback = self.options.on_progress.clone();
        let mut counter = UnitCounter::start(callback.as_ref(), files.len() as u64);

        for file in files {
            if let Some(token) = &self.options.cancel {
                token.check()?;
            }

            match self.fold_file(source, &file) {
                Ok(Some(dest)) => report.copied.push(dest),
                Ok(None) => report.duplicates.push(file.clone()),
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "skipping file");
                    report.faults.push(FileFault {
                        path: file.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            counter.step(&file);
        }

        info!(
            source = %source.display(),
            copied = report.copied.len(),
            duplicates = report.duplicates.len(),
            faults = report.faults.len(),
            "merged folder"
        );

        self.report.sources.push(report.clone());
        Ok(report)
    }

    /// Copy one file unless its content was already seen. Returns the destination.
    fn fold_file(&mut self, source: &Path, file: &Path) -> Result<Option<PathBuf>> {
        let fingerprint = fingerprint_file(file, self.options.algorithm)?;
        if self.seen.contains(&fingerprint) {
            debug!(path = %file.display(), %fingerprint, "duplicate content");
            return Ok(None);
        }

        let relative = self
            .options
            .layout
            .relative_name(source, file)
            .ok_or_else(|| Error::NotFound { path: file.to_path_buf() })?;
        let dest = self.target.join(relative);

        if let Some(parent) = dest.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        std::fs::copy(file, &dest).map_err(|e| Error::Write {
            path: dest.clone(),
            source: e,
        })?;
        self.seen.insert(fingerprint);
        debug!(from = %file.display(), to = %dest.display(), "copied");
        Ok(Some(dest))
    }

    pub fn finish(self) -> MergeReport { self.report }
}

/// Merge `sources[1..]` into `sources[0]` and report what happened.
pub fn merge(sources: &[PathBuf], options: &MergeOptions) -> Result<MergeReport> {
    let (target, rest) = sources.split_first().ok_or(Error::NoSources)?;
    let mut merger = DirectoryMerger::new(target.clone(), options.clone())?;
    for source in rest {
        merger.fold(source)?;
    }
    Ok(merger.finish())
}
