//! Path Canonicalization
//!
//! Collapses `.` and `..` segments, duplicate separators, and backslash
//! separators out of request paths before they are matched against routes
//! or the filesystem. A `..` at the root is swallowed rather than escaping
//! it, which is what makes `/../../etc/passwd` harmless.
//!
//! Already-canonical paths are returned borrowed; the common case does not
//! allocate.

use std::borrow::Cow;

use smallvec::SmallVec;

#[inline]
fn is_canonical(path: &str) -> bool {
    if path.contains('\\') || path.contains("//") {
        return false;
    }
    !path.split('/').any(|seg| seg == "." || seg == "..")
}

/// Canonicalize a request path.
///
/// `.` segments disappear, `..` removes the preceding segment (never
/// climbing above the root), `\` is treated as a separator and rewritten
/// to `/`, and runs of separators collapse. A trailing separator is kept
/// when any path remains under it.
pub fn canonicalize(path: &str) -> Cow<'_, str> {
    if is_canonical(path) {
        return Cow::Borrowed(path);
    }

    let absolute = matches!(path.as_bytes().first(), Some(b'/') | Some(b'\\'));
    let trailing = matches!(path.as_bytes().last(), Some(b'/') | Some(b'\\'));

    let mut segments: SmallVec<[&str; 16]> = SmallVec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            seg => segments.push(seg),
        }
    }

    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push('/');
    }
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(segment);
    }
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(path: &str) -> String {
        canonicalize(path).into_owned()
    }

    #[test]
    fn test_clean_paths_borrow() {
        for path in ["/", "/a/b/c", "/index.html", "", "/a.b/c.d/"] {
            assert!(matches!(canonicalize(path), Cow::Borrowed(_)), "{path}");
        }
    }

    #[test]
    fn test_dot_segments() {
        assert_eq!(canon("/a/./b"), "/a/b");
        assert_eq!(canon("/./a"), "/a");
        assert_eq!(canon("/a/."), "/a");
        assert_eq!(canon("./a"), "a");
    }

    #[test]
    fn test_dot_dot_segments() {
        assert_eq!(canon("/a/b/../c"), "/a/c");
        assert_eq!(canon("/a/.."), "/");
        assert_eq!(canon("/a/b/../../c"), "/c");
    }

    #[test]
    fn test_cannot_escape_root() {
        assert_eq!(canon("/.."), "/");
        assert_eq!(canon("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(canon("/a/../../.."), "/");
    }

    #[test]
    fn test_backslash_is_a_separator() {
        assert_eq!(canon("/a\\b"), "/a/b");
        assert_eq!(canon("\\a\\..\\b"), "/b");
        assert_eq!(canon("/a\\..\\..\\secret"), "/secret");
    }

    #[test]
    fn test_duplicate_separators_collapse() {
        assert_eq!(canon("//a///b"), "/a/b");
        assert_eq!(canon("/a//"), "/a/");
    }

    #[test]
    fn test_trailing_separator_kept() {
        assert_eq!(canon("/a/b//"), "/a/b/");
        assert_eq!(canon("/a/../"), "/");
    }
}
