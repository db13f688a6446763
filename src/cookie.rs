//! Cookie Parsing and Rendering
//!
//! Both directions of the cookie protocol:
//!
//! - **Request side**: [`parse_request_cookies`] reads the `Cookie` header
//!   leniently, because browsers and ancient clients ship all manner of
//!   near-RFC-6265 traffic. Quoted values are unwrapped, damaged pairs are
//!   skipped, and the legacy RFC 2109 `$Version`/`$Path`/`$Domain`
//!   attributes are folded into the adjacent cookie.
//! - **Response side**: [`Cookie::to_set_cookie_header`] renders strictly
//!   and refuses names or values that could smuggle a header boundary.
//!
//! Parsing enforces a configurable cookie-count ceiling so a hostile
//! header cannot allocate without bound.
//!
//! # Example
//!
//! ```rust
//! use gusset::cookie::{Cookie, CookieParseOptions, SameSite, parse_request_cookies};
//!
//! let cookies =
//!     parse_request_cookies("session=abc123; theme=dark", &CookieParseOptions::default())
//!         .unwrap();
//! assert_eq!(cookies[0].name, "session");
//!
//! let header = Cookie::new("session", "abc123")
//!     .with_path("/")
//!     .with_http_only(true)
//!     .with_same_site(SameSite::Lax)
//!     .to_set_cookie_header()
//!     .unwrap();
//! assert_eq!(header, "session=abc123; Path=/; HttpOnly; SameSite=Lax");
//! ```

use std::fmt;
use std::time::SystemTime;

use compact_str::CompactString;

use crate::date;
use crate::error::{Error, Result};
use crate::header_name::is_valid_token;

/// The `SameSite` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Parse the attribute value, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("strict") {
            Some(SameSite::Strict)
        } else if s.eq_ignore_ascii_case("lax") {
            Some(SameSite::Lax)
        } else if s.eq_ignore_ascii_case("none") {
            Some(SameSite::None)
        } else {
            None
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Cookie
// ============================================================================

/// An HTTP cookie with its response attributes.
///
/// Request-side parsing only fills `name`, `value`, and the legacy
/// `path`/`domain`/`version` fields; everything else belongs to
/// `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: CompactString,
    pub value: CompactString,
    pub path: Option<CompactString>,
    pub domain: Option<CompactString>,
    pub max_age: Option<i64>,
    pub expires: Option<SystemTime>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    pub comment: Option<CompactString>,
    /// RFC 2109 version; `0` for plain RFC 6265 cookies.
    pub version: u8,
    pub discard: bool,
}

impl Cookie {
    /// Create a cookie with a name and value and no attributes.
    pub fn new(name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        Self {
            name: CompactString::new(name.as_ref()),
            value: CompactString::new(value.as_ref()),
            path: None,
            domain: None,
            max_age: None,
            expires: None,
            secure: false,
            http_only: false,
            same_site: None,
            comment: None,
            version: 0,
            discard: false,
        }
    }

    pub fn with_path(mut self, path: impl AsRef<str>) -> Self {
        self.path = Some(CompactString::new(path.as_ref()));
        self
    }

    pub fn with_domain(mut self, domain: impl AsRef<str>) -> Self {
        self.domain = Some(CompactString::new(domain.as_ref()));
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn with_comment(mut self, comment: impl AsRef<str>) -> Self {
        self.comment = Some(CompactString::new(comment.as_ref()));
        self
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn with_discard(mut self, discard: bool) -> Self {
        self.discard = discard;
        self
    }

    /// Render a `Set-Cookie` header value.
    ///
    /// The name must be an RFC 9110 token. Values containing a space or
    /// comma are emitted as a quoted string; values containing `;`, `"`,
    /// `\`, or control bytes are rejected outright. Version-1 attributes
    /// (`Version`, `Comment`, `Discard`) only render when `version >= 1`.
    pub fn to_set_cookie_header(&self) -> Result<String> {
        if !is_valid_token(&self.name) {
            return Err(Error::InvalidCookie(format!(
                "cookie name is not a token: {:?}",
                self.name
            )));
        }
        check_value(&self.name, &self.value)?;

        let mut out = String::with_capacity(self.name.len() + self.value.len() + 48);
        out.push_str(&self.name);
        out.push('=');
        push_value(&mut out, &self.value);

        if self.version >= 1 {
            out.push_str("; Version=1");
        }
        if let Some(path) = &self.path {
            check_attribute(&self.name, "Path", path)?;
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            check_attribute(&self.name, "Domain", domain)?;
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            out.push_str("; Max-Age=");
            out.push_str(&max_age.to_string());
        }
        if let Some(expires) = self.expires {
            out.push_str("; Expires=");
            out.push_str(&date::format_http_date(expires));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        if self.version >= 1 {
            if let Some(comment) = &self.comment {
                check_attribute(&self.name, "Comment", comment)?;
                out.push_str("; Comment=");
                push_value(&mut out, comment);
            }
            if self.discard {
                out.push_str("; Discard");
            }
        }
        Ok(out)
    }
}

fn check_value(name: &str, value: &str) -> Result<()> {
    let ok = value
        .bytes()
        .all(|b| b >= 0x20 && b != 0x7f && b != b';' && b != b'"' && b != b'\\');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidCookie(format!(
            "illegal byte in value of cookie {name:?}"
        )))
    }
}

fn check_attribute(name: &str, attribute: &str, value: &str) -> Result<()> {
    let ok = value.bytes().all(|b| b >= 0x20 && b != 0x7f && b != b';');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidCookie(format!(
            "illegal byte in {attribute} of cookie {name:?}"
        )))
    }
}

fn push_value(out: &mut String, value: &str) {
    if value.contains([' ', ',']) {
        out.push('"');
        out.push_str(value);
        out.push('"');
    } else {
        out.push_str(value);
    }
}

// ============================================================================
// Request Cookie Parsing
// ============================================================================

/// Knobs for request-cookie parsing.
#[derive(Debug, Clone)]
pub struct CookieParseOptions {
    /// Upper bound on parsed cookies per header.
    pub max_cookies: usize,
    /// Keep `=` inside values (base64 padding survives). When off, the
    /// value ends at the first `=`.
    pub allow_equals_in_value: bool,
    /// Treat `,` as a pair separator in addition to `;` (RFC 2109 traffic).
    pub comma_is_separator: bool,
}

impl Default for CookieParseOptions {
    fn default() -> Self {
        Self {
            max_cookies: 200,
            allow_equals_in_value: true,
            comma_is_separator: false,
        }
    }
}

/// Parse a `Cookie` request header.
///
/// Pairs without `=` or with an empty name are skipped rather than
/// failing the whole header. The only hard failure is blowing through
/// `max_cookies`.
pub fn parse_request_cookies(
    header: &str,
    options: &CookieParseOptions,
) -> Result<Vec<Cookie>> {
    let separators: &[char] = if options.comma_is_separator {
        &[';', ',']
    } else {
        &[';']
    };

    let mut cookies: Vec<Cookie> = Vec::new();
    let mut version = 0u8;

    for part in header.split(separators) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((name, raw_value)) = part.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let raw_value = raw_value.trim();
        let raw_value = if options.allow_equals_in_value {
            raw_value
        } else {
            raw_value
                .split_once('=')
                .map(|(v, _)| v)
                .unwrap_or(raw_value)
        };
        let value = strip_value_quotes(raw_value);

        // RFC 2109 attributes ride alongside the cookie they describe.
        if let Some(attribute) = name.strip_prefix('$') {
            if attribute.eq_ignore_ascii_case("version") {
                version = value.parse().unwrap_or(0);
                for cookie in &mut cookies {
                    cookie.version = version;
                }
            } else if let Some(last) = cookies.last_mut() {
                if attribute.eq_ignore_ascii_case("path") {
                    last.path = Some(CompactString::new(value));
                } else if attribute.eq_ignore_ascii_case("domain") {
                    last.domain = Some(CompactString::new(value));
                }
            }
            continue;
        }

        if cookies.len() >= options.max_cookies {
            return Err(Error::LimitExceeded(format!(
                "request carries more than {} cookies",
                options.max_cookies
            )));
        }
        cookies.push(Cookie::new(name, value).with_version(version));
    }
    Ok(cookies)
}

fn strip_value_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

// ============================================================================
// Set-Cookie Parsing
// ============================================================================

/// Parse a `Set-Cookie` header value, for client-side use.
///
/// Unknown attributes are ignored; a missing or empty name yields `None`.
pub fn parse_set_cookie(header: &str) -> Option<Cookie> {
    let mut parts = header.split(';');
    let first = parts.next()?.trim();
    let (name, value) = first.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, strip_value_quotes(value.trim()));
    for part in parts {
        let part = part.trim();
        let (attribute, value) = match part.split_once('=') {
            Some((a, v)) => (a.trim(), Some(strip_value_quotes(v.trim()))),
            None => (part, None),
        };

        if attribute.eq_ignore_ascii_case("path") {
            cookie.path = value.map(CompactString::new);
        } else if attribute.eq_ignore_ascii_case("domain") {
            cookie.domain = value.map(CompactString::new);
        } else if attribute.eq_ignore_ascii_case("max-age") {
            cookie.max_age = value.and_then(|v| v.parse().ok());
        } else if attribute.eq_ignore_ascii_case("expires") {
            cookie.expires = value.and_then(date::parse_http_date);
        } else if attribute.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        } else if attribute.eq_ignore_ascii_case("httponly") {
            cookie.http_only = true;
        } else if attribute.eq_ignore_ascii_case("samesite") {
            cookie.same_site = value.and_then(SameSite::parse);
        } else if attribute.eq_ignore_ascii_case("comment") {
            cookie.comment = value.map(CompactString::new);
        } else if attribute.eq_ignore_ascii_case("version") {
            cookie.version = value.and_then(|v| v.parse().ok()).unwrap_or(0);
        } else if attribute.eq_ignore_ascii_case("discard") {
            cookie.discard = true;
        }
    }
    Some(cookie)
}

// ============================================================================
// Tests
// ============================================================================
