//! Case-Insensitive HTTP Header Names
//!
//! HTTP header names compare equal regardless of ASCII case, but the case a
//! peer sent (or a constant was declared with) is preserved for display. This
//! module provides the [`HeaderName`] type that encodes both rules, plus
//! `const` constants for the standard header names so hot paths never
//! re-validate them.
//!
//! ## Properties
//!
//! - **Validated**: only RFC 7230 `token` characters are accepted, so a name
//!   can never smuggle CR/LF or separators into a serialized header block
//! - **Case-preserving**: `as_str()` returns the original spelling
//! - **Case-insensitive**: `Eq`, `Ord`, and `Hash` all ignore ASCII case
//! - **Cheap**: backed by `CompactString`, names up to 24 bytes are inline

use compact_str::CompactString;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::Error;

/// Check whether a byte is an RFC 7230 `tchar`.
///
/// ```text
/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
/// ```
#[inline]
pub const fn is_token_byte(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
        | b'^' | b'_' | b'`' | b'|' | b'~'
        | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z')
}

/// Check whether every byte of `s` is a `tchar` and `s` is non-empty.
#[inline]
pub const fn is_valid_token(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        if !is_token_byte(bytes[i]) {
            return false;
        }
        i += 1;
    }
    true
}

/// A validated, case-insensitively compared HTTP header name.
///
/// # Example
///
/// ```rust
/// use gusset::header_name::{HeaderName, CONTENT_TYPE};
///
/// let name = HeaderName::new("content-type").unwrap();
/// assert_eq!(name, CONTENT_TYPE);
/// assert_eq!(name.as_str(), "content-type"); // original case kept
/// ```
#[derive(Clone)]
pub struct HeaderName {
    inner: CompactString,
}

impl HeaderName {
    /// Create a header name, validating it as an RFC 7230 token.
    pub fn new(name: impl AsRef<str>) -> Result<Self, Error> {
        let name = name.as_ref();
        if !is_valid_token(name) {
            return Err(Error::InvalidHeaderName(name.to_string()));
        }
        Ok(Self {
            inner: CompactString::new(name),
        })
    }

    /// Create a header name from a static string, validated at compile time
    /// when used in a `const` context.
    ///
    /// # Panics
    ///
    /// Panics if the string is not a valid token. For constants this is a
    /// compile error.
    pub const fn from_static(name: &'static str) -> Self {
        assert!(is_valid_token(name), "invalid header name");
        Self {
            inner: CompactString::const_new(name),
        }
    }

    /// The name as originally spelled.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always false: empty names fail validation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Case-insensitive comparison against a plain string.
    #[inline]
    pub fn eq_str(&self, other: &str) -> bool {
        self.inner.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for HeaderName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq_ignore_ascii_case(&other.inner)
    }
}

impl Eq for HeaderName {}

impl PartialEq<str> for HeaderName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.eq_str(other)
    }
}

impl PartialEq<&str> for HeaderName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.eq_str(other)
    }
}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for &b in self.inner.as_bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        // Delimiter, same scheme as str's prefix-free hashing.
        state.write_u8(0xff);
    }
}

impl Ord for HeaderName {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.inner.as_bytes().iter().map(u8::to_ascii_lowercase);
        let rhs = other.inner.as_bytes().iter().map(u8::to_ascii_lowercase);
        lhs.cmp(rhs)
    }
}

impl PartialOrd for HeaderName {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl FromStr for HeaderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for HeaderName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for HeaderName {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ============================================================================
// Well-Known Header Names
// ============================================================================

pub const ACCEPT: HeaderName = HeaderName::from_static("Accept");
pub const ACCEPT_CHARSET: HeaderName = HeaderName::from_static("Accept-Charset");
pub const ACCEPT_ENCODING: HeaderName = HeaderName::from_static("Accept-Encoding");
pub const ACCEPT_LANGUAGE: HeaderName = HeaderName::from_static("Accept-Language");
pub const ACCEPT_RANGES: HeaderName = HeaderName::from_static("Accept-Ranges");
pub const AUTHORIZATION: HeaderName = HeaderName::from_static("Authorization");
pub const CACHE_CONTROL: HeaderName = HeaderName::from_static("Cache-Control");
pub const CONNECTION: HeaderName = HeaderName::from_static("Connection");
pub const CONTENT_DISPOSITION: HeaderName = HeaderName::from_static("Content-Disposition");
pub const CONTENT_ENCODING: HeaderName = HeaderName::from_static("Content-Encoding");
pub const CONTENT_LENGTH: HeaderName = HeaderName::from_static("Content-Length");
pub const CONTENT_RANGE: HeaderName = HeaderName::from_static("Content-Range");
pub const CONTENT_TRANSFER_ENCODING: HeaderName =
    HeaderName::from_static("Content-Transfer-Encoding");
pub const CONTENT_TYPE: HeaderName = HeaderName::from_static("Content-Type");
pub const COOKIE: HeaderName = HeaderName::from_static("Cookie");
pub const DATE: HeaderName = HeaderName::from_static("Date");
pub const ETAG: HeaderName = HeaderName::from_static("ETag");
pub const EXPECT: HeaderName = HeaderName::from_static("Expect");
pub const EXPIRES: HeaderName = HeaderName::from_static("Expires");
pub const FORWARDED: HeaderName = HeaderName::from_static("Forwarded");
pub const HOST: HeaderName = HeaderName::from_static("Host");
pub const IF_MATCH: HeaderName = HeaderName::from_static("If-Match");
pub const IF_MODIFIED_SINCE: HeaderName = HeaderName::from_static("If-Modified-Since");
pub const IF_NONE_MATCH: HeaderName = HeaderName::from_static("If-None-Match");
pub const IF_RANGE: HeaderName = HeaderName::from_static("If-Range");
pub const IF_UNMODIFIED_SINCE: HeaderName = HeaderName::from_static("If-Unmodified-Since");
pub const LAST_MODIFIED: HeaderName = HeaderName::from_static("Last-Modified");
pub const LOCATION: HeaderName = HeaderName::from_static("Location");
pub const RANGE: HeaderName = HeaderName::from_static("Range");
pub const REFERER: HeaderName = HeaderName::from_static("Referer");
pub const RETRY_AFTER: HeaderName = HeaderName::from_static("Retry-After");
pub const SERVER: HeaderName = HeaderName::from_static("Server");
pub const SET_COOKIE: HeaderName = HeaderName::from_static("Set-Cookie");
pub const TE: HeaderName = HeaderName::from_static("TE");
pub const TRAILER: HeaderName = HeaderName::from_static("Trailer");
pub const TRANSFER_ENCODING: HeaderName = HeaderName::from_static("Transfer-Encoding");
pub const UPGRADE: HeaderName = HeaderName::from_static("Upgrade");
pub const USER_AGENT: HeaderName = HeaderName::from_static("User-Agent");
pub const VARY: HeaderName = HeaderName::from_static("Vary");
pub const VIA: HeaderName = HeaderName::from_static("Via");
pub const WWW_AUTHENTICATE: HeaderName = HeaderName::from_static("WWW-Authenticate");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("X-Forwarded-For");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("X-Forwarded-Proto");

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_case_insensitive_eq() {
        let a = HeaderName::new("Content-Type").unwrap();
        let b = HeaderName::new("content-type").unwrap();
        let c = HeaderName::new("CONTENT-TYPE").unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, CONTENT_TYPE);
    }

    #[test]
    fn test_case_preserved_for_display() {
        let name = HeaderName::new("X-Custom-HEADER").unwrap();
        assert_eq!(name.as_str(), "X-Custom-HEADER");
        assert_eq!(name.to_string(), "X-Custom-HEADER");
    }

    #[test]
    fn test_hash_ignores_case() {
        let mut map = HashMap::new();
        map.insert(HeaderName::new("Content-Length").unwrap(), 42u64);

        assert_eq!(
            map.get(&HeaderName::new("content-length").unwrap()),
            Some(&42)
        );
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(HeaderName::new("").is_err());
        assert!(HeaderName::new("Content Type").is_err());
        assert!(HeaderName::new("Content-Type:").is_err());
        assert!(HeaderName::new("Bad\r\nHeader").is_err());
        assert!(HeaderName::new("héader").is_err());
    }

    #[test]
    fn test_token_chars_accepted() {
        assert!(HeaderName::new("x-custom_header.v2").is_ok());
        assert!(HeaderName::new("!#$%&'*+-.^_`|~").is_ok());
    }

    #[test]
    fn test_eq_against_str() {
        assert_eq!(CONTENT_TYPE, "content-type");
        assert_eq!(CONTENT_TYPE, "Content-Type");
        assert!(CONTENT_TYPE != "content-length");
    }

    #[test]
    fn test_ordering_ignores_case() {
        let mut names = vec![
            HeaderName::new("b-header").unwrap(),
            HeaderName::new("A-Header").unwrap(),
            HeaderName::new("C-HEADER").unwrap(),
        ];
        names.sort();
        let order: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(order, vec!["A-Header", "b-header", "C-HEADER"]);
    }

    #[test]
    fn test_from_str() {
        let name: HeaderName = "Range".parse().unwrap();
        assert_eq!(name, RANGE);

        let err = "no spaces allowed".parse::<HeaderName>();
        assert!(err.is_err());
    }
}
