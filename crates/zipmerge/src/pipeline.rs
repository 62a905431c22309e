//! Pipeline - extract every input, merge the trees, compress the result.
//!
//! Each input archive is extracted into its own slot of a scratch area, the slots are
//! folded into the first one, and that tree is compressed into the output archive. The
//! scratch area is removed once the run reaches `Done` or `Failed`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use zipmerge_archive::{
    CompressOptions, CompressionLevel, CompressionReport, ExtractOptions, ExtractionReport,
    compress, extract_archive,
};
use zipmerge_fs::{
    CancelToken, DedupScope, DirectoryMerger, LayoutPolicy, MergeOptions, MergeReport, ScratchArea,
};
use zipmerge_verify::HashAlgorithm;

use crate::fault::{Fault, FaultRecord};
use crate::progress::{Observer, Phase, ProgressHandle, ProgressTracker};
use crate::source::ImportQueue;

/// File name of the output archive when none is configured.
pub const DEFAULT_OUTPUT_NAME: &str = "merged.zip";

/// Parameters of one merge run.
#[derive(Clone, Default)]
pub struct PipelineConfig {
    pub inputs: Vec<PathBuf>,
    /// Output archive. Defaults to [`DEFAULT_OUTPUT_NAME`] next to the first input.
    pub output: Option<PathBuf>,
    pub level: CompressionLevel,
    pub dedup_scope: DedupScope,
    pub layout: LayoutPolicy,
    pub algorithm: HashAlgorithm,
    /// Directory the scratch area is created in. Defaults to the system temp directory.
    pub scratch_dir: Option<PathBuf>,
    pub cancel: CancelToken,
    pub observer: Option<Observer>,
}

impl PipelineConfig {
    pub fn new<I, P>(inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_queue(queue: &ImportQueue) -> Self { Self::new(queue.paths()) }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

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

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Passes a run over these inputs takes: one extraction per input, one fold per
    /// input after the first, one compression.
    pub fn total_passes(&self) -> u32 {
        let inputs = self.inputs.len() as u32;
        inputs + inputs.saturating_sub(1) + 1
    }

    /// Where the output archive will be written.
    pub fn output_path(&self) -> Result<PathBuf, Fault> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        let first = self
            .inputs
            .first()
            .ok_or_else(|| Fault::config("at least one input archive is required"))?;
        let dir = first.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        Ok(dir.join(DEFAULT_OUTPUT_NAME))
    }

    /// Check everything that can be checked before writing anything.
    pub fn validate(&self) -> Result<PathBuf, Fault> {
        if self.inputs.is_empty() {
            return Err(Fault::config("at least one input archive is required"));
        }
        self.level.validate()?;
        let output = self.output_path()?;
        if self.inputs.iter().any(|input| same_location(input, &output)) {
            return Err(Fault::config(format!(
                "output '{}' would overwrite one of the inputs",
                output.display()
            )));
        }
        Ok(output)
    }
}

/// Whether two paths name the same file: equal base names in the same directory.
///
/// Parents are canonicalized so `./a.zip` and `a.zip` match. A parent that does not
/// exist cannot hold an input, so it never matches.
fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    if a.file_name().is_none() || a.file_name() != b.file_name() {
        return false;
    }
    let parent = |p: &Path| {
        p.parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .canonicalize()
            .ok()
    };
    match (parent(a), parent(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub output: PathBuf,
    pub extractions: Vec<ExtractionReport>,
    pub merge: MergeReport,
    pub compression: CompressionReport,
    /// Absorbed per-file faults.
    pub faults: Vec<FaultRecord>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum PipelineOutcome {
    Success(Box<RunReport>),
    /// Every fault collected up to and including the fatal one, in order.
    Failed { faults: Vec<FaultRecord> },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool { matches!(self, Self::Success(_)) }

    pub fn output(&self) -> Option<&Path> {
        match self {
            Self::Success(report) => Some(&report.output),
            Self::Failed { .. } => None,
        }
    }

    pub fn faults(&self) -> &[FaultRecord] {
        match self {
            Self::Success(report) => &report.faults,
            Self::Failed { faults } => faults,
        }
    }

    /// The fault that ended a failed run.
    pub fn fatal(&self) -> Option<&Fault> {
        self.faults().iter().rev().find(|r| r.fatal).map(|r| &r.fault)
    }
}

/// A single merge run.
pub struct MergePipeline {
    config: PipelineConfig,
    progress: ProgressTracker,
    phase: Phase,
    faults: Vec<FaultRecord>,
}

impl MergePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let progress = ProgressTracker::new(config.observer.clone());
        Self {
            config,
            progress,
            phase: Phase::Idle,
            faults: Vec::new(),
        }
    }

    /// Progress view that stays valid while the run executes on another thread.
    pub fn progress(&self) -> ProgressHandle { self.progress.handle() }

    pub fn phase(&self) -> Phase { self.phase }

    /// Cancelling this token stops the run at the next work item.
    pub fn cancel_token(&self) -> CancelToken { self.config.cancel.clone() }

    /// Execute the run to completion.
    pub fn run(mut self) -> PipelineOutcome {
        match self.execute() {
            Ok(report) => {
                self.transition(Phase::Done);
                self.progress.status(&format!("Merged archive written to '{}'", report.output.display()));
                info!(output = %report.output.display(), faults = report.faults.len(), "merge finished");
                PipelineOutcome::Success(Box::new(report))
            }
            Err(fault) => {
                let phase = self.phase;
                warn!(%phase, error = %fault, "merge failed");
                self.faults.push(FaultRecord { phase, fault, fatal: true });
                self.transition(Phase::Failed);
                self.progress.status("Merge failed");
                PipelineOutcome::Failed { faults: self.faults }
            }
        }
    }

    fn transition(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, "phase change");
        self.phase = phase;
        self.progress.enter(phase);
    }

    fn check_cancelled(&self) -> Result<(), Fault> {
        if self.config.cancel.is_cancelled() { Err(Fault::Cancelled) } else { Ok(()) }
    }

    fn execute(&mut self) -> Result<RunReport, Fault> {
        let output = self.config.validate()?;
        self.check_cancelled()?;

        let mut scratch = match &self.config.scratch_dir {
            Some(dir) => ScratchArea::new_in(dir)?,
            None => ScratchArea::new()?,
        };
        debug!(scratch = %scratch.path().display(), "scratch area ready");

        let result = self.run_phases(&mut scratch, output);

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.discard() {
            warn!(scratch = %scratch_path.display(), error = %e, "failed to remove scratch area");
            self.faults.push(FaultRecord {
                phase: self.phase,
                fault: e.into(),
                fatal: false,
            });
        }
        result
    }

    fn run_phases(&mut self, scratch: &mut ScratchArea, output: PathBuf) -> Result<RunReport, Fault> {
        self.progress.start(self.config.total_passes());

        let extractions = self.extract_inputs(scratch)?;
        let merge = self.merge_slots(scratch.slots())?;
        let compression = self.compress_target(&merge.target, &output)?;

        Ok(RunReport {
            output,
            extractions,
            merge,
            compression,
            faults: self.faults.clone(),
        })
    }

    fn extract_inputs(&mut self, scratch: &mut ScratchArea) -> Result<Vec<ExtractionReport>, Fault> {
        self.transition(Phase::Extracting);
        let _span = info_span!("phase", step = Phase::Extracting.step_name()).entered();

        let options = ExtractOptions::default()
            .on_progress(self.progress.callback())
            .cancel(self.config.cancel.clone());

        let inputs = self.config.inputs.clone();
        let mut reports = Vec::with_capacity(inputs.len());
        for input in &inputs {
            self.check_cancelled()?;
            let slot = scratch.allocate(input)?;

            self.progress.begin_pass();
            let report = extract_archive(input, &slot, &options)?;
            self.progress.finish_pass();

            self.progress.status(&format!(
                "Extracted '{}' ({} entries)",
                input.display(),
                report.entry_count()
            ));
            reports.push(report);
        }
        Ok(reports)
    }

    fn merge_slots(&mut self, slots: &[PathBuf]) -> Result<MergeReport, Fault> {
        self.transition(Phase::Merging);
        let _span = info_span!("phase", step = Phase::Merging.step_name()).entered();

        let (target, rest) = slots
            .split_first()
            .ok_or_else(|| Fault::config("at least one input archive is required"))?;

        let options = MergeOptions::default()
            .dedup_scope(self.config.dedup_scope)
            .layout(self.config.layout)
            .algorithm(self.config.algorithm)
            .on_progress(self.progress.callback())
            .cancel(self.config.cancel.clone());
        let mut merger = DirectoryMerger::new(target, options)?;
        self.absorb(
            Phase::Merging,
            merger.report().target_faults.iter().map(|f| (f.path.clone(), f.reason.clone())),
        );

        for source in rest {
            self.check_cancelled()?;
            self.progress.begin_pass();
            let folded = merger.fold(source)?;
            self.progress.finish_pass();

            self.absorb(
                Phase::Merging,
                folded.faults.iter().map(|f| (f.path.clone(), f.reason.clone())),
            );
            self.progress.status(&format!(
                "Merged folders: '{}' into '{}'",
                source.display(),
                target.display()
            ));
        }
        Ok(merger.finish())
    }

    fn compress_target(&mut self, target: &Path, output: &Path) -> Result<CompressionReport, Fault> {
        self.transition(Phase::Compressing);
        let _span = info_span!("phase", step = Phase::Compressing.step_name()).entered();
        self.check_cancelled()?;

        let options = CompressOptions::default()
            .level(self.config.level)
            .layout(self.config.layout)
            .algorithm(self.config.algorithm)
            .on_progress(self.progress.callback())
            .cancel(self.config.cancel.clone());

        self.progress.begin_pass();
        let report = compress(target, output, &options)?;
        self.progress.finish_pass();

        self.absorb(
            Phase::Compressing,
            report.faults.iter().map(|f| (f.path.clone(), f.reason.clone())),
        );
        self.progress.status(&format!(
            "Compressed {} files into '{}'",
            report.entries.len(),
            output.display()
        ));
        Ok(report)
    }

    /// Record per-file faults that did not stop the phase.
    fn absorb(&mut self, phase: Phase, faults: impl Iterator<Item = (PathBuf, String)>) {
        for (path, reason) in faults {
            self.faults.push(FaultRecord {
                phase,
                fault: Fault::io(path, reason),
                fatal: false,
            });
        }
    }
}

/// Build and run a pipeline in one call.
pub fn run(config: PipelineConfig) -> PipelineOutcome { MergePipeline::new(config).run() }
