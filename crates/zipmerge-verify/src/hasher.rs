use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::{Error, Fingerprint};

#[cfg(feature = "sha256")]
use sha2::Digest as _;

/// Incremental digest producing a [`Fingerprint`].
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Fingerprint;
}

pub struct Blake3Hasher(blake3::Hasher);

impl Hasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Fingerprint { Fingerprint::from_bytes(*self.0.finalize().as_bytes()) }
}

impl Default for Blake3Hasher {
    fn default() -> Self { Self::new() }
}

impl Blake3Hasher {
    pub fn new() -> Self { Self(blake3::Hasher::new()) }
}

#[cfg(feature = "sha256")]
pub struct Sha256Hasher(sha2::Sha256);

#[cfg(feature = "sha256")]
impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Fingerprint {
        let mut bytes = [0u8; crate::FINGERPRINT_LEN];
        bytes.copy_from_slice(&self.0.finalize());
        Fingerprint::from_bytes(bytes)
    }
}

#[cfg(feature = "sha256")]
impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "sha256")]
impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }
}

/// Hasher selected at runtime from a [`HashAlgorithm`].
pub enum AnyHasher {
    Blake3(Blake3Hasher),
    #[cfg(feature = "sha256")]
    Sha256(Sha256Hasher),
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(h) => h.update(data),
            #[cfg(feature = "sha256")]
            Self::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Fingerprint {
        match self {
            Self::Blake3(h) => h.finalize(),
            #[cfg(feature = "sha256")]
            Self::Sha256(h) => h.finalize(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    #[cfg(feature = "sha256")]
    Sha256,
}

impl HashAlgorithm {
    pub fn hasher(self) -> AnyHasher {
        match self {
            Self::Blake3 => AnyHasher::Blake3(Blake3Hasher::new()),
            #[cfg(feature = "sha256")]
            Self::Sha256 => AnyHasher::Sha256(Sha256Hasher::new()),
        }
    }

    /// One-shot digest of an in-memory buffer.
    pub fn digest(self, data: &[u8]) -> Fingerprint {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            #[cfg(feature = "sha256")]
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3),
            #[cfg(feature = "sha256")]
            "sha256" | "sha-256" => Ok(Self::Sha256),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}
