//! Header Token Parsing
//!
//! Parses comma-separated `name=value` lists out of headers like
//! `Authorization: Digest username="bob", realm="users"`. Values may be
//! bare tokens or quoted strings; quoted strings support backslash escapes
//! (`\"` inside a realm is common).
//!
//! The parser is lenient in the way header consumers need to be: unknown
//! names pass through untouched and bare flags without `=` are skipped. An
//! unterminated quote abandons the remainder of the header.

use compact_str::CompactString;

/// One parsed `name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderToken {
    /// The name, original case preserved.
    pub name: CompactString,
    /// The value, quotes stripped and escapes resolved.
    pub value: CompactString,
    /// Whether the value arrived as a quoted string.
    pub quoted: bool,
}

/// Parse every `name=value` pair in a header, in order of appearance.
pub fn parse_tokens(header: &str) -> Vec<HeaderToken> {
    let bytes = header.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t' | b',') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let name_start = pos;
        while pos < bytes.len() && !matches!(bytes[pos], b'=' | b',') {
            pos += 1;
        }
        // Bare token without a value.
        if pos >= bytes.len() || bytes[pos] == b',' {
            continue;
        }
        let name = header[name_start..pos].trim();
        pos += 1;

        if name.is_empty() {
            continue;
        }

        while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t') {
            pos += 1;
        }

        if bytes.get(pos) == Some(&b'"') {
            pos += 1;
            match scan_quoted(&header[pos..]) {
                Some((value, consumed)) => {
                    pos += consumed;
                    tokens.push(HeaderToken {
                        name: CompactString::new(name),
                        value,
                        quoted: true,
                    });
                }
                // Unterminated quote: nothing after this can be trusted.
                None => break,
            }
        } else {
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != b',' {
                pos += 1;
            }
            tokens.push(HeaderToken {
                name: CompactString::new(name),
                value: CompactString::new(header[value_start..pos].trim()),
                quoted: false,
            });
        }
    }
    tokens
}

/// Scan a quoted-string body, resolving backslash escapes.
///
/// `input` starts just past the opening quote; returns the value and the
/// number of bytes consumed including the closing quote.
fn scan_quoted(input: &str) -> Option<(CompactString, usize)> {
    let mut value = CompactString::const_new("");
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            value.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some((value, i + 1)),
            _ => value.push(c),
        }
    }
    None
}

/// Look up a token by name, case-insensitively.
pub fn find_token<'a>(tokens: &'a [HeaderToken], name: &str) -> Option<&'a str> {
    tokens
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .map(|t| t.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_challenge() {
        let tokens = parse_tokens(
            "username=\"bob\", realm=\"users\", nonce=\"abc123\", uri=\"/dir/index.html\"",
        );
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].name, "username");
        assert_eq!(tokens[0].value, "bob");
        assert!(tokens[0].quoted);
        assert_eq!(find_token(&tokens, "NONCE"), Some("abc123"));
    }

    #[test]
    fn test_unquoted_values() {
        let tokens = parse_tokens("algorithm=MD5, qop=auth");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, "MD5");
        assert!(!tokens[0].quoted);
        assert_eq!(tokens[1].value, "auth");
    }

    #[test]
    fn test_escaped_quotes() {
        let tokens = parse_tokens(r#"realm="say \"hi\" there""#);
        assert_eq!(tokens[0].value, r#"say "hi" there"#);
    }

    #[test]
    fn test_comma_inside_quotes() {
        let tokens = parse_tokens(r#"a="x,y", b=z"#);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, "x,y");
        assert_eq!(tokens[1].value, "z");
    }

    #[test]
    fn test_bare_tokens_skipped() {
        let tokens = parse_tokens("gzip, level=9, chunked");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "level");
    }

    #[test]
    fn test_unterminated_quote_stops() {
        let tokens = parse_tokens(r#"a="ok", b="broken"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "a");
    }

    #[test]
    fn test_whitespace_tolerance() {
        let tokens = parse_tokens("  a = 1 ,\t b = \"2\" ");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, "1");
        assert_eq!(tokens[1].value, "2");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tokens("").is_empty());
        assert!(parse_tokens(" , , ").is_empty());
    }
}
