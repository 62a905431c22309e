use std::io::{Read, Seek};

use crate::Result;
use crate::extract::{EntrySource, PendingEntry, PendingKind};

/// Entries of a zip archive, in central directory order.
pub struct ZipSource<R: Read + Seek> {
    archive: ::zip::ZipArchive<R>,
    index: usize,
}

impl<R: Read + Seek> ZipSource<R> {
    /// Reads the central directory. A reader that is not a zip archive is
    /// [`Error::Corrupted`](crate::Error::Corrupted).
    pub fn new(reader: R) -> Result<Self> {
        let archive = ::zip::ZipArchive::new(reader)?;
        Ok(Self { archive, index: 0 })
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    type Reader<'a>
        = Box<dyn Read + 'a>
    where
        Self: 'a;

    fn entry_count(&self) -> usize { self.archive.len() }

    fn next_entry(&mut self) -> Option<Result<PendingEntry<Self::Reader<'_>>>> {
        if self.index >= self.archive.len() {
            return None;
        }

        let file = match self.archive.by_index(self.index) {
            Ok(f) => f,
            Err(e) => return Some(Err(e.into())),
        };
        self.index += 1;

        // The raw name is kept so escaping entries surface as zip-slip, not as unnamed.
        let name = file.name().to_string();
        let size = file.size();
        let kind = if file.is_dir() {
            PendingKind::Directory
        } else {
            PendingKind::File(Box::new(file) as Box<dyn Read + '_>)
        };

        Some(Ok(PendingEntry { name, size, kind }))
    }
}
