use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::{Error, HashAlgorithm, Hasher, HashingReader, Result};

pub const FINGERPRINT_LEN: usize = 32;

const READ_BUFFER: usize = 64 * 1024;

/// Digest over a file's full byte content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self { Self(bytes) }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] { &self.0 }

    pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Fingerprint everything `reader` yields until EOF.
pub fn fingerprint_reader<R: Read>(reader: R, algorithm: HashAlgorithm) -> io::Result<Fingerprint> {
    let mut reader = HashingReader::new(reader, algorithm.hasher());
    io::copy(&mut reader, &mut io::sink())?;
    Ok(reader.finish())
}

/// Fingerprint the content of the file at `path` in one streaming pass.
pub fn fingerprint_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<Fingerprint> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = algorithm.hasher();
    let mut buffer = vec![0u8; READ_BUFFER];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::Read {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn same_content_different_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/other.bin"), "hello").unwrap();

        let a = fingerprint_file(dir.path().join("a.txt"), HashAlgorithm::Blake3).unwrap();
        let b = fingerprint_file(dir.path().join("nested/other.bin"), HashAlgorithm::Blake3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_differs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("b.txt"), "world").unwrap();

        let a = fingerprint_file(dir.path().join("a.txt"), HashAlgorithm::Blake3).unwrap();
        let b = fingerprint_file(dir.path().join("b.txt"), HashAlgorithm::Blake3).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn file_larger_than_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..READ_BUFFER * 3 + 17).map(|i| (i % 251) as u8).collect();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, &data).unwrap();

        let streamed = fingerprint_file(&path, HashAlgorithm::Blake3).unwrap();
        assert_eq!(streamed, HashAlgorithm::Blake3.digest(&data));
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = fingerprint_file(&missing, HashAlgorithm::Blake3).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert_eq!(err.path(), Some(missing.as_path()));
    }

    #[test]
    fn display_is_lowercase_hex() {
        let fp = HashAlgorithm::Blake3.digest(b"");
        let shown = fp.to_string();
        assert_eq!(shown.len(), FINGERPRINT_LEN * 2);
        assert!(shown.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    proptest! {
        #[test]
        fn reader_and_one_shot_agree(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let streamed = fingerprint_reader(&data[..], HashAlgorithm::Blake3).unwrap();
            prop_assert_eq!(streamed, HashAlgorithm::Blake3.digest(&data));
        }

        #[test]
        fn deterministic_across_calls(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
            prop_assert_eq!(
                HashAlgorithm::Blake3.digest(&data),
                HashAlgorithm::Blake3.digest(&data)
            );
        }
    }
}
