use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: String,
    /// Normalized path relative to the base. Empty for entries naming the base itself.
    pub relative: PathBuf,
    pub resolved: PathBuf,
}

/// Resolve an archive entry name against `base`, refusing anything that would land
/// outside it.
///
/// Both `/` and `\` separate segments. `.` and empty segments are dropped, `..` pops
/// the previous segment. Absolute names, drive prefixes, and `..` with nothing left to
/// pop are rejected as [`Error::ZipSlip`].
pub fn sanitize_entry_path(entry: &str, base: &Path) -> Result<SanitizedPath> {
    if entry.contains('\0') {
        return Err(Error::InvalidPath {
            entry: entry.to_string(),
            base: base.to_path_buf(),
        });
    }

    let zip_slip = || Error::ZipSlip {
        entry: entry.to_string(),
        base: base.to_path_buf(),
    };

    if entry.starts_with('/') || entry.starts_with('\\') {
        return Err(zip_slip());
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in entry.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(zip_slip());
                }
            }
            // Drive prefixes such as `C:` are absolute on Windows.
            s if s.contains(':') => return Err(zip_slip()),
            s => parts.push(s),
        }
    }

    let relative: PathBuf = parts.iter().collect();
    let resolved = base.join(&relative);

    Ok(SanitizedPath {
        original: entry.to_string(),
        relative,
        resolved,
    })
}
