use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fully qualified path in the file system, in POSIX form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbsoluteFsPath(String);

impl AbsoluteFsPath {
    pub fn new(path: String) -> Self {
        AbsoluteFsPath(path)
    }

    pub fn from<P: AsRef<Path>>(path: P) -> Self {
        AbsoluteFsPath(super::util::normalize_separators(
            &path.as_ref().to_string_lossy(),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for AbsoluteFsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for AbsoluteFsPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl From<&str> for AbsoluteFsPath {
    fn from(path: &str) -> Self {
        AbsoluteFsPath::from(Path::new(path))
    }
}

impl From<String> for AbsoluteFsPath {
    fn from(path: String) -> Self {
        AbsoluteFsPath::from(Path::new(&path))
    }
}

impl std::fmt::Display for AbsoluteFsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A path that's relative to another (unspecified) root.
///
/// This does not necessarily have to refer to a physical file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment(String);

impl PathSegment {
    pub fn new(path: String) -> Self {
        PathSegment(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PathSegment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
