use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open '{path}' for hashing: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read '{path}' to completion: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("unknown hash algorithm '{0}'")]
    UnknownAlgorithm(String),
}

impl Error {
    /// The file the failure refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } => Some(path),
            Self::UnknownAlgorithm(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
