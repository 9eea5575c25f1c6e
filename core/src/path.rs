//! Dotted flag paths.

use std::fmt;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// The flattened name of a leaf field, e.g. `b.x`.
///
/// Segments map 1:1 onto the nesting chain from the root parameter to the
/// leaf. Segments are validated before paths are built, so a segment never
/// contains the separator.
///
/// # Examples
///
/// ```
/// use record_args_core::DottedPath;
///
/// let path = DottedPath::root("model").child("num_layers");
/// assert_eq!(path.as_str(), "model.num_layers");
/// assert_eq!(path.segments().collect::<Vec<_>>(), vec!["model", "num_layers"]);
/// assert_eq!(path.depth(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DottedPath(String);

impl DottedPath {
    /// Path of a root-level parameter or field.
    pub fn root(segment: &str) -> Self {
        Self(segment.to_string())
    }

    /// Path of a field nested under `self`.
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}{PATH_SEPARATOR}{segment}", self.0))
    }

    /// Extends `prefix` with `segment`, or starts a new path.
    pub fn join(prefix: Option<&DottedPath>, segment: &str) -> Self {
        match prefix {
            Some(prefix) => prefix.child(segment),
            None => Self::root(segment),
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DottedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<DottedPath> for String {
    fn from(path: DottedPath) -> Self {
        path.0
    }
}

/// Returns `true` if `segment` can be used as one path segment.
///
/// Segments are identifiers: an ASCII letter or `_`, then letters, digits,
/// `_` or `-`.
pub fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_with_and_without_prefix() {
        let root = DottedPath::join(None, "a");
        assert_eq!(root.as_str(), "a");
        assert_eq!(DottedPath::join(Some(&root), "b").to_string(), "a.b");
    }

    #[test]
    fn test_segment_validity() {
        assert!(is_valid_segment("num_layers"));
        assert!(!is_valid_segment("a.b"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment("  "));
    }

    #[test]
    fn test_segments_are_identifiers() {
        assert!(is_valid_segment("_private"));
        assert!(is_valid_segment("dry-run"));
        assert!(is_valid_segment("param_3"));
        assert!(!is_valid_segment("-x"));
        assert!(!is_valid_segment("a=b"));
        assert!(!is_valid_segment("a b"));
        assert!(!is_valid_segment("3d"));
    }
}
