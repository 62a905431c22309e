use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use zipmerge::MergeProgress;

const PB_STYLE: &str = "{spinner:.blue} {prefix:>17.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

/// Terminal view of a run: one bar over all passes, status lines printed above it.
pub struct PassBar {
    pb: ProgressBar,
    last_status: Mutex<String>,
}

impl PassBar {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        let pb = match ProgressStyle::with_template(PB_STYLE) {
            Ok(style) => pb.with_style(style.tick_chars(TICK).progress_chars(PB_CHARS)),
            Err(_) => pb,
        };
        Self {
            pb,
            last_status: Mutex::new(String::new()),
        }
    }

    pub fn update(&self, progress: &MergeProgress) {
        self.pb.set_length(u64::from(progress.total_passes));
        self.pb.set_position(u64::from(progress.pass));
        self.pb.set_prefix(progress.phase.step_name());
        if let Some(name) = progress.current_file.as_deref().and_then(|f| f.file_name()) {
            self.pb.set_message(name.to_string_lossy().into_owned());
        }

        let mut last = self.last_status.lock().unwrap_or_else(|e| e.into_inner());
        if !progress.status.is_empty() && *last != progress.status {
            // A hidden bar swallows println, so fall back to plain stderr.
            if self.pb.is_hidden() {
                eprintln!("{}", progress.status);
            } else {
                self.pb.println(&progress.status);
            }
            last.clone_from(&progress.status);
        }
    }

    pub fn finish(&self) { self.pb.finish_and_clear(); }
}
