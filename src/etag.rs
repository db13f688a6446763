//! Entity Tags
//!
//! Parsing, rendering, and comparison for the `ETag`, `If-Match`, and
//! `If-None-Match` headers.
//!
//! - **Strong** tags (`"abc123"`) assert byte-for-byte identity.
//! - **Weak** tags (`W/"abc123"`) assert semantic equivalence.
//!
//! [`ETagList::parse`] scans the comma-separated list form with quote
//! awareness: a comma inside a quoted tag is part of the tag, not a
//! separator.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::{CompactString, format_compact};

/// An entity tag, without the surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag {
    pub value: CompactString,
    pub weak: bool,
}

impl ETag {
    /// Create a strong ETag.
    pub fn strong(value: impl AsRef<str>) -> Self {
        Self {
            value: CompactString::new(value.as_ref()),
            weak: false,
        }
    }

    /// Create a weak ETag.
    pub fn weak(value: impl AsRef<str>) -> Self {
        Self {
            value: CompactString::new(value.as_ref()),
            weak: true,
        }
    }

    /// Parse a single ETag header value, e.g. `"abc"` or `W/"abc"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (weak, quoted) = match s.strip_prefix("W/").or_else(|| s.strip_prefix("w/")) {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let value = quoted.strip_prefix('"')?.strip_suffix('"')?;
        if value.contains('"') {
            return None;
        }
        Some(Self {
            value: CompactString::new(value),
            weak,
        })
    }

    /// Derive a strong ETag from a file's size and modification time, the
    /// usual choice for filesystem-backed resources.
    pub fn from_file_metadata(size: u64, modified: SystemTime) -> Self {
        let modified_unix = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            value: format_compact!("{size:x}-{modified_unix:x}"),
            weak: false,
        }
    }

    /// Render as a header value, quotes and weakness prefix included.
    pub fn to_header_value(&self) -> String {
        if self.weak {
            format!("W/\"{}\"", self.value)
        } else {
            format!("\"{}\"", self.value)
        }
    }

    /// Strong comparison: both tags strong, values identical.
    #[inline]
    pub fn strong_match(&self, other: &ETag) -> bool {
        !self.weak && !other.weak && self.value == other.value
    }

    /// Weak comparison: values identical, weakness ignored.
    #[inline]
    pub fn weak_match(&self, other: &ETag) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.value)
        } else {
            write!(f, "\"{}\"", self.value)
        }
    }
}

// ============================================================================
// ETag Lists (If-Match / If-None-Match)
// ============================================================================

/// The value of an `If-Match` or `If-None-Match` header: either the
/// wildcard `*` or a list of tags.
#[derive(Debug, Clone, Default)]
pub struct ETagList {
    pub etags: Vec<ETag>,
    pub any: bool,
}

impl ETagList {
    /// An ETag list that matches everything (`*`).
    pub fn any() -> Self {
        Self {
            etags: Vec::new(),
            any: true,
        }
    }

    /// Parse a header value into a list of tags.
    ///
    /// Runs of unparseable input are skipped up to the next separator, so
    /// one damaged tag does not discard its neighbours.
    pub fn parse(header: &str) -> Self {
        let header = header.trim();
        if header == "*" {
            return Self::any();
        }

        let mut etags = Vec::new();
        let bytes = header.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b' ' | b'\t' | b',' => pos += 1,
                _ => {
                    let weak = bytes[pos..].starts_with(b"W/") || bytes[pos..].starts_with(b"w/");
                    let quote_start = pos + if weak { 2 } else { 0 };

                    if bytes.get(quote_start) == Some(&b'"') {
                        match memchr::memchr(b'"', &bytes[quote_start + 1..]) {
                            Some(rel) => {
                                let end = quote_start + 1 + rel;
                                etags.push(ETag {
                                    value: CompactString::new(&header[quote_start + 1..end]),
                                    weak,
                                });
                                pos = end + 1;
                                continue;
                            }
                            None => break,
                        }
                    }
                    // Not a tag; resync at the next separator.
                    match memchr::memchr(b',', &bytes[pos..]) {
                        Some(rel) => pos += rel + 1,
                        None => break,
                    }
                }
            }
        }

        Self { etags, any: false }
    }

    /// Check membership with weak comparison.
    pub fn contains_weak(&self, etag: &ETag) -> bool {
        self.any || self.etags.iter().any(|e| e.weak_match(etag))
    }

    /// Check membership with strong comparison. The wildcard matches any
    /// current representation, weak-tagged or not.
    pub fn contains_strong(&self, etag: &ETag) -> bool {
        self.any || self.etags.iter().any(|e| e.strong_match(etag))
    }

    /// Check if the list has no tags and is not the wildcard.
    pub fn is_empty(&self) -> bool {
        !self.any && self.etags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strong() {
        let etag = ETag::parse("\"abc123\"").unwrap();
        assert!(!etag.weak);
        assert_eq!(etag.value, "abc123");
        assert_eq!(etag.to_header_value(), "\"abc123\"");
    }

    #[test]
    fn test_parse_weak() {
        let etag = ETag::parse("W/\"abc123\"").unwrap();
        assert!(etag.weak);
        assert_eq!(etag.value, "abc123");
        assert_eq!(etag.to_string(), "W/\"abc123\"");

        let lower = ETag::parse("w/\"abc123\"").unwrap();
        assert!(lower.weak);
    }

    #[test]
    fn test_parse_rejects_unquoted() {
        assert!(ETag::parse("abc123").is_none());
        assert!(ETag::parse("\"unclosed").is_none());
        assert!(ETag::parse("\"a\"b\"").is_none());
    }

    #[test]
    fn test_match_semantics() {
        let s1 = ETag::strong("abc");
        let s2 = ETag::strong("abc");
        let w1 = ETag::weak("abc");

        assert!(s1.strong_match(&s2));
        assert!(!s1.strong_match(&w1));
        assert!(s1.weak_match(&w1));
        assert!(!s1.weak_match(&ETag::strong("xyz")));
    }

    #[test]
    fn test_from_file_metadata_is_deterministic() {
        let modified = UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let a = ETag::from_file_metadata(1024, modified);
        let b = ETag::from_file_metadata(1024, modified);
        assert_eq!(a, b);
        assert!(!a.weak);
    }

    #[test]
    fn test_list_parse() {
        let list = ETagList::parse("\"abc\", \"def\", W/\"ghi\"");
        assert_eq!(list.etags.len(), 3);
        assert!(!list.any);
        assert!(list.etags[2].weak);
    }

    #[test]
    fn test_list_parse_comma_inside_tag() {
        let list = ETagList::parse("\"a,b\", \"c\"");
        assert_eq!(list.etags.len(), 2);
        assert_eq!(list.etags[0].value, "a,b");
        assert_eq!(list.etags[1].value, "c");
    }

    #[test]
    fn test_list_parse_skips_damage() {
        let list = ETagList::parse("garbage, \"ok\"");
        assert_eq!(list.etags.len(), 1);
        assert_eq!(list.etags[0].value, "ok");
    }

    #[test]
    fn test_list_wildcard() {
        let list = ETagList::parse("*");
        assert!(list.any);
        assert!(list.contains_weak(&ETag::weak("x")));
        assert!(list.contains_strong(&ETag::strong("x")));
        // `If-Match: *` asks for any current representation, so even a
        // weak-tagged one satisfies the strong check.
        assert!(list.contains_strong(&ETag::weak("x")));
    }

    #[test]
    fn test_list_membership() {
        let list = ETagList::parse("\"abc\", W/\"def\"");

        assert!(list.contains_weak(&ETag::weak("abc")));
        assert!(list.contains_weak(&ETag::strong("def")));
        assert!(list.contains_strong(&ETag::strong("abc")));
        assert!(!list.contains_strong(&ETag::weak("abc")));
        assert!(!list.contains_strong(&ETag::strong("def")));
    }

    #[test]
    fn test_list_empty() {
        assert!(ETagList::parse("").is_empty());
        assert!(!ETagList::parse("*").is_empty());
    }
}
