#![forbid(unsafe_code)]

//! Dot-path helpers.
//!
//! Paths are field names joined with `.`. The root prefix is the empty
//! string, so the first segment never carries a leading separator.

/// Path separator.
pub const SEPARATOR: char = '.';

/// Append `key` to `prefix`.
///
/// ```
/// use dialkit_core::path::join;
///
/// assert_eq!(join("", "speed"), "speed");
/// assert_eq!(join("motion.spring", "bounce"), "motion.spring.bounce");
/// ```
#[must_use]
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        return key.to_owned();
    }
    let mut path = String::with_capacity(prefix.len() + 1 + key.len());
    path.push_str(prefix);
    path.push(SEPARATOR);
    path.push_str(key);
    path
}

/// Split a path into its segments. The empty path has no segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Everything before the last segment, or `None` for a top-level path.
#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|idx| &path[..idx])
}

/// The last segment.
#[must_use]
pub fn leaf_name(path: &str) -> &str {
    path.rfind(SEPARATOR).map_or(path, |idx| &path[idx + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_without_leading_separator() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "b"), "a.b");
        assert_eq!(join("a.b", "c"), "a.b.c");
    }

    #[test]
    fn segments_skip_empty() {
        assert_eq!(segments("a.b.c").collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(segments("").count(), 0);
        assert_eq!(segments("a..b").collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn parent_and_leaf() {
        assert_eq!(parent("a.b.c"), Some("a.b"));
        assert_eq!(parent("a"), None);
        assert_eq!(leaf_name("a.b.c"), "c");
        assert_eq!(leaf_name("a"), "a");
    }
}
