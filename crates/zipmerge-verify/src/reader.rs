use std::io::{self, Read};

use crate::{Fingerprint, Hasher};

/// Reader that hashes data as it passes through.
///
/// Lets a caller fingerprint content while copying it elsewhere, so every byte is
/// touched once.
pub struct HashingReader<R, H> {
    reader: R,
    hasher: H,
    bytes_read: u64,
}

impl<R, H> HashingReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self { reader, hasher, bytes_read: 0 }
    }

    pub fn bytes_read(&self) -> u64 { self.bytes_read }
}

impl<R, H: Hasher> HashingReader<R, H> {
    /// Finalize the digest over everything read so far.
    pub fn finish(self) -> Fingerprint { self.hasher.finalize() }
}

impl<R: Read, H: Hasher> Read for HashingReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}
