//! Content fingerprints for deduplicating extracted archive trees.
//!
//! Files are hashed in one streaming pass with a bounded buffer, so memory use does
//! not depend on file size. Two files with the same [`Fingerprint`] are treated as
//! identical content regardless of name, location or timestamps.
//!
//! # Example
//!
//! ```
//! use zipmerge_verify::{HashAlgorithm, HashingReader};
//!
//! let mut reader = HashingReader::new(&b"hello"[..], HashAlgorithm::Blake3.hasher());
//! std::io::copy(&mut reader, &mut std::io::sink()).unwrap();
//!
//! assert_eq!(reader.finish(), HashAlgorithm::Blake3.digest(b"hello"));
//! ```

pub use self::error::{Error, Result};
pub use self::fingerprint::{Fingerprint, FINGERPRINT_LEN, fingerprint_file, fingerprint_reader};
pub use self::hasher::{AnyHasher, Blake3Hasher, HashAlgorithm, Hasher};
pub use self::reader::HashingReader;

#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

mod error;
mod fingerprint;
mod hasher;
mod reader;
