use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;
use zipmerge_fs::{CancelToken, LayoutPolicy, ProgressFn};
use zipmerge_verify::HashAlgorithm;

use crate::error::{Error, Result};

#[derive(Clone, Default)]
pub struct ExtractOptions {
    /// Fingerprint every file entry while it is written.
    pub hash: Option<HashAlgorithm>,
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancelToken>,
}

impl ExtractOptions {
    pub fn hash(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash = Some(algorithm);
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

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Compression applied to every entry of an output archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionLevel {
    /// No compression.
    Stored,
    Fastest,
    /// Deflate at its default level.
    #[default]
    Optimal,
    SmallestSize,
    /// Explicit deflate level, 0 through 9.
    Level(i64),
}

impl CompressionLevel {
    pub const MAX_DEFLATE_LEVEL: i64 = 9;

    /// Named levels, in the order a picker would list them.
    pub fn all() -> [CompressionLevel; 4] {
        [Self::Stored, Self::Fastest, Self::Optimal, Self::SmallestSize]
    }

    pub fn validate(self) -> Result<Self> {
        match self {
            Self::Level(n) if !(0..=Self::MAX_DEFLATE_LEVEL).contains(&n) => {
                Err(Error::UnsupportedCompressionLevel(n.to_string()))
            }
            level => Ok(level),
        }
    }

    pub(crate) fn file_options(self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default();
        match self {
            Self::Stored => options.compression_method(CompressionMethod::Stored),
            Self::Fastest => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(1)),
            Self::Optimal => options.compression_method(CompressionMethod::Deflated),
            Self::SmallestSize => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(Self::MAX_DEFLATE_LEVEL)),
            Self::Level(n) => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(n)),
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => f.write_str("stored"),
            Self::Fastest => f.write_str("fastest"),
            Self::Optimal => f.write_str("optimal"),
            Self::SmallestSize => f.write_str("smallest"),
            Self::Level(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let level = match s.to_ascii_lowercase().as_str() {
            "stored" | "none" | "nocompression" => Self::Stored,
            "fastest" | "fast" => Self::Fastest,
            "optimal" | "default" => Self::Optimal,
            "smallest" | "smallestsize" | "smallest-size" => Self::SmallestSize,
            other => other
                .parse::<i64>()
                .map(Self::Level)
                .map_err(|_| Error::UnsupportedCompressionLevel(s.to_string()))?,
        };
        level.validate()
    }
}

#[derive(Clone, Default)]
pub struct CompressOptions {
    pub level: CompressionLevel,
    pub layout: LayoutPolicy,
    pub algorithm: HashAlgorithm,
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancelToken>,
}

impl CompressOptions {
    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
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

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}
