use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unit progress of one sub-task (an extraction, a merge fold, a compression).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub processed: u64,
    pub total: u64,
    pub current_file: Option<PathBuf>,
}

impl Progress {
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }
}

pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Emits one [`Progress`] per unit of work against a ceiling fixed up front.
///
/// The ceiling is published immediately on [`UnitCounter::start`], so observers know
/// it before the first unit arrives.
pub struct UnitCounter<'a> {
    callback: Option<&'a ProgressFn>,
    processed: u64,
    total: u64,
}

impl<'a> UnitCounter<'a> {
    pub fn start(callback: Option<&'a ProgressFn>, total: u64) -> Self {
        if let Some(callback) = callback {
            callback(Progress { processed: 0, total, current_file: None });
        }
        Self { callback, processed: 0, total }
    }

    pub fn step(&mut self, current_file: &Path) {
        self.processed += 1;
        if let Some(callback) = self.callback {
            callback(Progress {
                processed: self.processed,
                total: self.total,
                current_file: Some(current_file.to_path_buf()),
            });
        }
    }

    pub fn processed(&self) -> u64 { self.processed }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn ceiling_published_before_first_unit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));

        let mut counter = UnitCounter::start(Some(&callback), 2);
        counter.step(Path::new("a.txt"));
        counter.step(Path::new("b.txt"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], Progress { processed: 0, total: 2, current_file: None });
        assert_eq!(seen[2].processed, 2);
        assert_eq!(seen[2].current_file.as_deref(), Some(Path::new("b.txt")));
    }

    #[test]
    fn percentage_of_empty_task_is_complete() {
        let progress = Progress { processed: 0, total: 0, current_file: None };
        assert_eq!(progress.percentage(), 100.0);
    }

    #[test]
    fn percentage_halfway() {
        let progress = Progress { processed: 5, total: 10, current_file: None };
        assert_eq!(progress.percentage(), 50.0);
    }
}
