use std::path::PathBuf;

use serde::Serialize;

use crate::progress::Phase;

/// Everything that can go wrong in a merge run.
///
/// Faults are plain data so they can be collected, cloned into reports and serialized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Fault {
    #[error("not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("entry '{entry}' escapes '{destination}'")]
    Traversal { entry: String, destination: PathBuf },

    #[error("{}", io_message(.path, .message))]
    Io { path: Option<PathBuf>, message: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("operation cancelled")]
    Cancelled,
}

fn io_message(path: &Option<PathBuf>, message: &str) -> String {
    match path {
        Some(path) => format!("i/o failure on '{}': {message}", path.display()),
        None => format!("i/o failure: {message}"),
    }
}

impl Fault {
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not-found",
            Self::Traversal { .. } => "traversal",
            Self::Io { .. } => "io",
            Self::Config { .. } => "config",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<zipmerge_verify::Error> for Fault {
    fn from(e: zipmerge_verify::Error) -> Self {
        Self::Io {
            path: e.path().map(PathBuf::from),
            message: e.to_string(),
        }
    }
}

impl From<zipmerge_fs::Error> for Fault {
    fn from(e: zipmerge_fs::Error) -> Self {
        use zipmerge_fs::Error;
        match e {
            Error::NotFound { path } => Self::NotFound { path },
            Error::Read { ref path, .. } | Error::Write { ref path, .. } => Self::io(path.clone(), e.to_string()),
            Error::Hash(inner) => inner.into(),
            Error::NoSources | Error::UnknownOption { .. } => Self::config(e.to_string()),
            Error::Cancelled => Self::Cancelled,
        }
    }
}

impl From<zipmerge_archive::Error> for Fault {
    fn from(e: zipmerge_archive::Error) -> Self {
        use zipmerge_archive::Error;
        match e {
            Error::NotFound { path } => Self::NotFound { path },
            Error::ZipSlip { entry, base } | Error::InvalidPath { entry, base } => Self::Traversal {
                entry,
                destination: base,
            },
            Error::Open { ref path, .. }
            | Error::ExtractionFailed { ref path, .. }
            | Error::DirectoryCreationFailed { ref path, .. }
            | Error::CreateArchive { ref path, .. }
            | Error::FinishArchive { ref path, .. }
            | Error::EntryFailed { ref path, .. } => Self::io(path.clone(), e.to_string()),
            Error::Corrupted(_) => Self::Io {
                path: None,
                message: e.to_string(),
            },
            Error::UnsupportedCompressionLevel(_) => Self::config(e.to_string()),
            Error::Cancelled => Self::Cancelled,
            Error::Fs(inner) => inner.into(),
        }
    }
}

/// A fault tagged with the pipeline step it happened in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaultRecord {
    pub phase: Phase,
    pub fault: Fault,
    /// Whether the fault ended the run. Absorbed per-file faults are not fatal.
    pub fatal: bool,
}

impl FaultRecord {
    pub fn status_line(&self) -> String { self.phase.status_line(&self.fault.to_string()) }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn zip_slip_becomes_traversal() {
        let fault: Fault = zipmerge_archive::Error::ZipSlip {
            entry: "../evil.txt".to_string(),
            base: PathBuf::from("/scratch/000-a"),
        }
        .into();
        assert_eq!(
            fault,
            Fault::Traversal {
                entry: "../evil.txt".to_string(),
                destination: PathBuf::from("/scratch/000-a"),
            }
        );
        assert_eq!(fault.kind(), "traversal");
    }

    #[test]
    fn invalid_entry_path_names_its_destination() {
        let fault: Fault = zipmerge_archive::Error::InvalidPath {
            entry: "bad\0name".to_string(),
            base: PathBuf::from("/scratch/001-b"),
        }
        .into();
        assert_eq!(
            fault,
            Fault::Traversal {
                entry: "bad\0name".to_string(),
                destination: PathBuf::from("/scratch/001-b"),
            }
        );
    }

    #[test]
    fn nested_fs_errors_keep_their_kind() {
        let fault: Fault = zipmerge_archive::Error::from(zipmerge_fs::Error::NotFound {
            path: PathBuf::from("gone"),
        })
        .into();
        assert_eq!(fault, Fault::NotFound { path: PathBuf::from("gone") });

        let fault: Fault = zipmerge_fs::Error::Write {
            path: PathBuf::from("out/a.txt"),
            source: io::Error::other("disk full"),
        }
        .into();
        assert!(matches!(fault, Fault::Io { path: Some(ref p), .. } if p == &PathBuf::from("out/a.txt")));
    }

    #[test]
    fn bad_options_are_config_faults() {
        let fault: Fault = zipmerge_archive::Error::UnsupportedCompressionLevel("12".into()).into();
        assert_eq!(fault.kind(), "config");
        let fault: Fault = zipmerge_fs::Error::NoSources.into();
        assert_eq!(fault.kind(), "config");
    }

    #[test]
    fn record_status_line_is_step_tagged() {
        let record = FaultRecord {
            phase: Phase::Merging,
            fault: Fault::io("a.txt", "denied"),
            fatal: false,
        };
        assert_eq!(record.status_line(), "[Merging Files] i/o failure on 'a.txt': denied");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(Fault::Cancelled).unwrap();
        assert_eq!(json["kind"], "cancelled");
    }
}
