use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("zip-slip attack detected: entry '{entry}' resolves outside '{base}'")]
    ZipSlip { entry: String, base: PathBuf },

    #[error("entry path '{entry}' is not a valid relative path under '{base}'")]
    InvalidPath { entry: String, base: PathBuf },

    #[error("failed to open '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("archive is corrupted: {0}")]
    Corrupted(#[from] zip::result::ZipError),

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("failed to create archive '{path}': {source}")]
    CreateArchive { path: PathBuf, source: io::Error },

    #[error("failed to finish archive '{path}': {source}")]
    FinishArchive { path: PathBuf, source: zip::result::ZipError },

    #[error("failed to add '{path}' to archive: {reason}")]
    EntryFailed { path: PathBuf, reason: String },

    #[error("unsupported compression level '{0}'")]
    UnsupportedCompressionLevel(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Fs(zipmerge_fs::Error),
}

impl From<zipmerge_fs::Error> for Error {
    fn from(e: zipmerge_fs::Error) -> Self {
        match e {
            zipmerge_fs::Error::NotFound { path } => Self::NotFound { path },
            zipmerge_fs::Error::Cancelled => Self::Cancelled,
            other => Self::Fs(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
