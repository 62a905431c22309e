use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// How a file found under a source root is named at its destination.
///
/// `Flatten` keeps only the base name, so two different files sharing a base name
/// collapse onto one destination and the later one overwrites the earlier.
/// `PreserveRelative` keeps the path relative to the source root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPolicy {
    #[default]
    Flatten,
    PreserveRelative,
}

impl LayoutPolicy {
    /// Destination path of `file` relative to the target root.
    pub fn relative_name(self, root: &Path, file: &Path) -> Option<PathBuf> {
        match self {
            Self::Flatten => file.file_name().map(PathBuf::from),
            Self::PreserveRelative => {
                let relative = file.strip_prefix(root).ok()?;
                (!relative.as_os_str().is_empty()).then(|| relative.to_path_buf())
            }
        }
    }

    /// Slash-separated archive entry name for `file`.
    pub fn entry_name(self, root: &Path, file: &Path) -> Option<String> {
        let relative = self.relative_name(root, file)?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                _ => return None,
            }
        }
        Some(parts.join("/"))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flatten => "flatten",
            Self::PreserveRelative => "preserve",
        }
    }
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for LayoutPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flatten" | "flat" => Ok(Self::Flatten),
            "preserve" | "preserve-relative" => Ok(Self::PreserveRelative),
            _ => Err(Error::UnknownOption {
                kind: "layout policy",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_keeps_base_name() {
        let name = LayoutPolicy::Flatten.relative_name(Path::new("/src"), Path::new("/src/a/b/c.txt"));
        assert_eq!(name, Some(PathBuf::from("c.txt")));
    }

    #[test]
    fn preserve_keeps_relative_path() {
        let name = LayoutPolicy::PreserveRelative
            .relative_name(Path::new("/src"), Path::new("/src/a/b/c.txt"));
        assert_eq!(name, Some(PathBuf::from("a/b/c.txt")));
    }

    #[test]
    fn preserve_outside_root_is_none() {
        let name = LayoutPolicy::PreserveRelative
            .relative_name(Path::new("/src"), Path::new("/elsewhere/c.txt"));
        assert_eq!(name, None);
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let root = Path::new("src");
        let file = root.join("nested").join("deep").join("file.bin");
        assert_eq!(
            LayoutPolicy::PreserveRelative.entry_name(root, &file).as_deref(),
            Some("nested/deep/file.bin")
        );
        assert_eq!(LayoutPolicy::Flatten.entry_name(root, &file).as_deref(), Some("file.bin"));
    }

    #[test]
    fn parse_policy() {
        assert_eq!("Flatten".parse::<LayoutPolicy>().unwrap(), LayoutPolicy::Flatten);
        assert_eq!("preserve".parse::<LayoutPolicy>().unwrap(), LayoutPolicy::PreserveRelative);
        assert!(matches!(
            "sideways".parse::<LayoutPolicy>(),
            Err(Error::UnknownOption { kind: "layout policy", .. })
        ));
    }
}
