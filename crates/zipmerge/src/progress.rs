//! Run-wide progress state.
//!
//! The pipeline is the only writer. Readers hold a [`ProgressHandle`] and take
//! snapshots, which may already be stale when they are looked at.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use zipmerge_fs::{Progress, ProgressFn};

/// Pipeline state. Runs move `Idle → Extracting → Merging → Compressing → Done`,
/// or to `Failed` from any working state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    Extracting,
    Merging,
    Compressing,
    Done,
    Failed,
}

impl Phase {
    /// Step name used as the prefix of status lines.
    pub fn step_name(self) -> &'static str {
        match self {
            Self::Idle => "Selecting Files",
            Self::Extracting => "Extracting Files",
            Self::Merging => "Merging Files",
            Self::Compressing => "Compressing Files",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    pub fn status_line(self, message: &str) -> String { format!("[{}] {message}", self.step_name()) }

    pub fn is_terminal(self) -> bool { matches!(self, Self::Done | Self::Failed) }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.step_name()) }
}

/// One bounded sub-task meter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Meter {
    pub max: u64,
    pub value: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeProgress {
    pub phase: Phase,
    pub pass: u32,
    pub total_passes: u32,
    pub current_file: Option<PathBuf>,
    /// Active sub-task meters, outermost first.
    pub meters: Vec<Meter>,
    /// Latest step-tagged status line.
    pub status: String,
}

impl MergeProgress {
    pub fn fraction(&self) -> f32 {
        if self.total_passes == 0 {
            0.0
        } else {
            self.pass as f32 / self.total_passes as f32
        }
    }
}

pub type Observer = Arc<dyn Fn(&MergeProgress) + Send + Sync>;

/// Read-only view of a run's progress.
#[derive(Clone, Default)]
pub struct ProgressHandle(Arc<RwLock<MergeProgress>>);

impl ProgressHandle {
    pub fn snapshot(&self) -> MergeProgress {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Writer side of the progress state, owned by a pipeline run.
#[derive(Clone, Default)]
pub(crate) struct ProgressTracker {
    state: ProgressHandle,
    observer: Option<Observer>,
}

impl ProgressTracker {
    pub(crate) fn new(observer: Option<Observer>) -> Self {
        Self {
            state: ProgressHandle::default(),
            observer,
        }
    }

    pub(crate) fn handle(&self) -> ProgressHandle { self.state.clone() }

    fn update(&self, f: impl FnOnce(&mut MergeProgress)) {
        let snapshot = {
            let mut state = self.state.0.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state);
            state.clone()
        };
        if let Some(observer) = &self.observer {
            observer(&snapshot);
        }
    }

    pub(crate) fn start(&self, total_passes: u32) {
        self.update(|p| {
            p.pass = 0;
            p.total_passes = total_passes;
            p.meters = vec![Meter {
                max: u64::from(total_passes),
                value: 0,
            }];
        });
    }

    pub(crate) fn enter(&self, phase: Phase) { self.update(|p| p.phase = phase); }

    /// Record a status line, tagged with the current phase.
    pub(crate) fn status(&self, message: &str) {
        self.update(|p| p.status = p.phase.status_line(message));
    }

    /// Open a sub-task meter. Its ceiling arrives through [`Self::callback`].
    pub(crate) fn begin_pass(&self) { self.update(|p| p.meters.push(Meter::default())); }

    /// Close the innermost sub-task meter and count one pass.
    pub(crate) fn finish_pass(&self) {
        self.update(|p| {
            if p.meters.len() > 1 {
                p.meters.pop();
            }
            p.pass += 1;
            if let Some(outer) = p.meters.first_mut() {
                outer.value = u64::from(p.pass);
            }
        });
    }

    /// Unit progress callback for components; drives the innermost meter.
    pub(crate) fn callback(&self) -> ProgressFn {
        let tracker = self.clone();
        Arc::new(move |unit: Progress| {
            tracker.update(|p| {
                if let Some(meter) = p.meters.last_mut() {
                    meter.max = unit.total;
                    meter.value = unit.processed;
                }
                if unit.current_file.is_some() {
                    p.current_file = unit.current_file;
                }
            });
        })
    }
}
