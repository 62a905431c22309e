use std::collections::BTreeSet;
use std::path::Path;

use zipmerge_verify::{Fingerprint, HashAlgorithm, fingerprint_file};

use crate::{Result, list_files};

/// Distinct content fingerprints of every file under `dir`.
pub fn content_set(dir: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<BTreeSet<Fingerprint>> {
    let mut set = BTreeSet::new();
    for file in list_files(dir)? {
        set.insert(fingerprint_file(&file, algorithm)?);
    }
    Ok(set)
}

/// Whether two directories hold the same distinct file contents.
///
/// Names, layout and duplicate counts are ignored.
pub fn same_content(a: impl AsRef<Path>, b: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<bool> {
    Ok(content_set(a, algorithm)? == content_set(b, algorithm)?)
}
