//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// Character substituted for anything that cannot appear in a file name.
const PLACEHOLDER: char = '_';

/// A path normalized to use forward slashes internally.
///
/// Target paths come from configuration files written on any platform, so
/// they are stored with forward slashes and converted to the native form
/// only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a relative segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let segment = segment.trim_start_matches("./");
        if self.inner.is_empty() || self.inner == "." {
            return Self {
                inner: segment.to_string(),
            };
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Whether the path is absolute (Unix root or Windows drive prefix).
    pub fn is_absolute(&self) -> bool {
        let bytes = self.inner.as_bytes();
        self.inner.starts_with('/')
            || (bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b":/")
    }

    /// Resolve this path against `base` unless it is already absolute.
    pub fn resolve_against(&self, base: &NormalizedPath) -> Self {
        if self.is_absolute() {
            self.clone()
        } else {
            base.join(&self.inner)
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }

    /// The containing directory; `.` for a bare file name.
    pub fn parent(&self) -> Self {
        match self.inner.trim_end_matches('/').rfind('/') {
            Some(0) => Self {
                inner: "/".to_string(),
            },
            Some(idx) => Self {
                inner: self.inner[..idx].to_string(),
            },
            None => Self {
                inner: ".".to_string(),
            },
        }
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Turn an arbitrary name into a single path-safe file name component.
///
/// Path separators, characters reserved on Windows, and control characters
/// become `_`. An empty name maps to a single placeholder.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => PLACEHOLDER,
            c if c.is_control() => PLACEHOLDER,
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslashes_are_normalized() {
        let path = NormalizedPath::new("src\\lib\\mod.rs");
        assert_eq!(path.as_str(), "src/lib/mod.rs");
    }

    #[test]
    fn join_strips_current_dir_prefix() {
        let base = NormalizedPath::new("/project");
        assert_eq!(base.join("./pkg/utils.go").as_str(), "/project/pkg/utils.go");
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let base = NormalizedPath::new("/project");
        let abs = NormalizedPath::new("/elsewhere/file.txt");
        assert_eq!(abs.resolve_against(&base), abs);

        let win = NormalizedPath::new("C:\\work\\file.txt");
        assert!(win.is_absolute());
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let base = NormalizedPath::new("/project");
        let rel = NormalizedPath::new("lib/a.py");
        assert_eq!(rel.resolve_against(&base).as_str(), "/project/lib/a.py");
    }

    #[test]
    fn parent_of_relative_and_absolute() {
        assert_eq!(NormalizedPath::new("a/b/c.yaml").parent().as_str(), "a/b");
        assert_eq!(NormalizedPath::new("/c.yaml").parent().as_str(), "/");
        assert_eq!(NormalizedPath::new("c.yaml").parent().as_str(), ".");
    }

    #[test]
    fn file_name_of_trailing_slash() {
        assert_eq!(NormalizedPath::new("a/b/").file_name(), Some("b"));
        assert_eq!(NormalizedPath::new("").file_name(), None);
    }

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_file_name("owner/repo:utils*"), "owner_repo_utils_");
        assert_eq!(sanitize_file_name("a<b>c|d?\"e\\f"), "a_b_c_d__e_f");
        assert_eq!(sanitize_file_name("tab\there"), "tab_here");
        assert_eq!(sanitize_file_name(""), "_");
        assert_eq!(sanitize_file_name("plain-name.v2"), "plain-name.v2");
    }
}
