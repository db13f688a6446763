//! Percent-Encoding and Query Strings
//!
//! Decoding for request targets and query strings. The path decoder can
//! leave `%2F` encoded: a router that has already split on `/` must not
//! have literal slashes conjured into matched segments afterwards. Query
//! component decoding additionally maps `+` to space.
//!
//! Malformed escapes (`%G1`, truncated `%2`) are hard errors rather than
//! pass-through; a front end turns them into a 400.

use std::borrow::Cow;

use compact_str::CompactString;

use crate::error::{Error, Result};

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode_inner(input: &str, decode_slash: bool, plus_as_space: bool) -> Result<Cow<'_, str>> {
    if memchr::memchr2(b'%', b'+', input.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'%' => {
                let (hi, lo) = match (bytes.get(pos + 1), bytes.get(pos + 2)) {
                    (Some(&hi), Some(&lo)) => (hi, lo),
                    _ => {
                        return Err(Error::InvalidUrlEncoding(format!(
                            "truncated escape at byte {pos}"
                        )));
                    }
                };
                let byte = match (hex_value(hi), hex_value(lo)) {
                    (Some(hi), Some(lo)) => (hi << 4) | lo,
                    _ => {
                        return Err(Error::InvalidUrlEncoding(format!(
                            "bad hex digits at byte {pos}"
                        )));
                    }
                };
                if byte == b'/' && !decode_slash {
                    out.extend_from_slice(&bytes[pos..pos + 3]);
                } else {
                    out.push(byte);
                }
                pos += 3;
            }
            b'+' if plus_as_space => {
                out.push(b' ');
                pos += 1;
            }
            b => {
                out.push(b);
                pos += 1;
            }
        }
    }

    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|_| Error::InvalidUrlEncoding("decoded bytes are not UTF-8".to_string()))
}

/// Decode a percent-encoded path component.
///
/// With `decode_slash` off, `%2F` stays encoded so segment boundaries
/// survive decoding. `+` is left alone; it is only special in query
/// strings.
#[inline]
pub fn decode(input: &str, decode_slash: bool) -> Result<Cow<'_, str>> {
    decode_inner(input, decode_slash, false)
}

/// Decode a query-string component: full percent-decoding plus `+` as
/// space.
#[inline]
pub fn decode_query_component(input: &str) -> Result<Cow<'_, str>> {
    decode_inner(input, true, true)
}

/// Percent-encode a string for use in a query component.
#[inline]
pub fn encode(input: &str) -> Cow<'_, str> {
    urlencoding::encode(input)
}

/// Parse a query string into decoded `(name, value)` pairs.
///
/// Order and duplicates are preserved. A key without `=` gets an empty
/// value; empty keys are dropped.
pub fn parse_query_string(query: &str) -> Result<Vec<(CompactString, CompactString)>> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut pairs = Vec::new();

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        if key.is_empty() {
            continue;
        }
        pairs.push((
            CompactString::new(decode_query_component(key)?),
            CompactString::new(decode_query_component(value)?),
        ));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_input_borrows() {
        assert!(matches!(decode("/a/b/c", true), Ok(Cow::Borrowed(_))));
    }

    #[test]
    fn test_basic_decode() {
        assert_eq!(decode("/caf%C3%A9", true).unwrap(), "/café");
        assert_eq!(decode("%7E", true).unwrap(), "~");
    }

    #[test]
    fn test_slash_preservation() {
        assert_eq!(decode("/a%2Fb", true).unwrap(), "/a/b");
        assert_eq!(decode("/a%2Fb", false).unwrap(), "/a%2Fb");
        // Other escapes still decode around the kept %2F.
        assert_eq!(decode("/a%2Fb%20c", false).unwrap(), "/a%2Fb c");
    }

    #[test]
    fn test_plus_handling() {
        assert_eq!(decode("a+b", true).unwrap(), "a+b");
        assert_eq!(decode_query_component("a+b").unwrap(), "a b");
    }

    #[test]
    fn test_malformed_escapes() {
        assert!(decode("%", true).is_err());
        assert!(decode("%2", true).is_err());
        assert!(decode("%GG", true).is_err());
        assert!(decode("%C3%28", true).is_err()); // invalid UTF-8
    }

    #[test]
    fn test_encode_roundtrip() {
        let original = "a b/c&d=e";
        let encoded = encode(original);
        assert_eq!(encoded, "a%20b%2Fc%26d%3De");
        assert_eq!(decode_query_component(&encoded).unwrap(), original);
    }

    #[test]
    fn test_parse_query_string() {
        let pairs = parse_query_string("a=1&b=two+words&c%20d=3&flag").unwrap();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0], ("a".into(), "1".into()));
        assert_eq!(pairs[1], ("b".into(), "two words".into()));
        assert_eq!(pairs[2], ("c d".into(), "3".into()));
        assert_eq!(pairs[3], ("flag".into(), "".into()));
    }

    #[test]
    fn test_parse_query_string_duplicates_and_junk() {
        let pairs = parse_query_string("?x=1&x=2&&=orphan").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].1, "1");
        assert_eq!(pairs[1].1, "2");
    }

    #[test]
    fn test_parse_query_string_bad_escape() {
        assert!(parse_query_string("a=%zz").is_err());
    }
}
