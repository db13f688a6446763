//! Multi-Valued Case-Insensitive Header Storage
//!
//! This module provides a stack-allocated header map for typical HTTP
//! messages. Most requests carry fewer than 8 distinct header names, so the
//! entries are stored inline and looked up with a linear scan; for N < 20 a
//! scan over contiguous memory beats hashing.
//!
//! Unlike a plain string map, every name may hold several values: `append`
//! records an additional value (the `Set-Cookie` case), `insert` replaces
//! the whole entry. Lookup is case-insensitive everywhere, and iteration
//! preserves both the first-insertion order of names and the append order of
//! values under each name.
//!
//! # Example
//!
//! ```rust
//! use gusset::header_map::HeaderMap;
//! use gusset::header_name::SET_COOKIE;
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("Content-Type", "application/json").unwrap();
//! headers.append(SET_COOKIE, "a=1").unwrap();
//! headers.append(SET_COOKIE, "b=2").unwrap();
//!
//! assert_eq!(headers.get("content-type"), Some("application/json"));
//! assert_eq!(headers.get_all("set-cookie").count(), 2);
//! ```

use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt;

use crate::error::Error;
use crate::header_name::{self, HeaderName};

/// Number of header entries stored inline (on stack).
/// Typical requests carry 5-10 distinct names.
pub const INLINE_HEADER_ENTRIES: usize = 8;

/// Check whether a string is a legal header field value.
///
/// Permits HTAB, SP, visible ASCII, and obs-text; rejects CR, LF, and other
/// control bytes so a stored value can never split a serialized header block.
#[inline]
pub fn is_valid_header_value(value: &str) -> bool {
    value.bytes().all(|b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}

// ============================================================================
// Name Conversion
// ============================================================================

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::HeaderName {}
    impl Sealed for &super::HeaderName {}
    impl Sealed for &str {}
}

/// Types accepted as header names by [`HeaderMap::insert`] and
/// [`HeaderMap::append`]: a [`HeaderName`] (or reference, no re-validation)
/// or a `&str` (validated on the way in).
pub trait IntoHeaderName: sealed::Sealed {
    fn into_header_name(self) -> Result<HeaderName, Error>;
}

impl IntoHeaderName for HeaderName {
    #[inline]
    fn into_header_name(self) -> Result<HeaderName, Error> {
        Ok(self)
    }
}

impl IntoHeaderName for &HeaderName {
    #[inline]
    fn into_header_name(self) -> Result<HeaderName, Error> {
        Ok(self.clone())
    }
}

impl IntoHeaderName for &str {
    #[inline]
    fn into_header_name(self) -> Result<HeaderName, Error> {
        HeaderName::new(self)
    }
}

// ============================================================================
// Header Values
// ============================================================================

/// The values recorded under one header name, in append order.
///
/// A `HeaderValues` handed out by the map is never empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderValues {
    inner: SmallVec<[CompactString; 1]>,
}

impl HeaderValues {
    #[inline]
    fn single(value: CompactString) -> Self {
        let mut inner = SmallVec::new();
        inner.push(value);
        Self { inner }
    }

    /// First (oldest) value.
    #[inline]
    pub fn first(&self) -> Option<&str> {
        self.inner.first().map(CompactString::as_str)
    }

    /// Last (most recently appended) value.
    #[inline]
    pub fn last(&self) -> Option<&str> {
        self.inner.last().map(CompactString::as_str)
    }

    /// Value at `index`, in append order.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.inner.get(index).map(CompactString::as_str)
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the values in append order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(CompactString::as_str)
    }
}

impl fmt::Debug for HeaderValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a HeaderValues {
    type Item = &'a str;
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, CompactString>,
        fn(&'a CompactString) -> &'a str,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(CompactString::as_str)
    }
}

// ============================================================================
// Header Map
// ============================================================================

#[derive(Clone)]
struct HeaderEntry {
    name: HeaderName,
    values: HeaderValues,
}

/// A compact multi-valued header map with case-insensitive names.
///
/// Stores up to [`INLINE_HEADER_ENTRIES`] entries inline, only allocating on
/// the heap when a message carries more distinct names.
#[derive(Clone, Default)]
pub struct HeaderMap {
    entries: SmallVec<[HeaderEntry; INLINE_HEADER_ENTRIES]>,
}

impl HeaderMap {
    /// Create a new empty header map.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    /// Create with pre-allocated capacity for `capacity` distinct names.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SmallVec::with_capacity(capacity),
        }
    }

    /// Check if storage is inline (no heap allocation for the entry table).
    #[inline]
    pub fn is_inline(&self) -> bool {
        !self.entries.spilled()
    }

    /// Total number of values across all names.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.values.len()).sum()
    }

    /// Number of distinct header names.
    #[inline]
    pub fn names_len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name.eq_str(name))
    }

    /// Get the first value for a name (case-insensitive).
    #[inline]
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|e| e.name.eq_str(name))
            .and_then(|e| e.values.first())
    }

    /// Iterate over every value recorded for a name, in append order.
    ///
    /// Empty iterator if the name is absent.
    pub fn get_all(&self, name: impl AsRef<str>) -> impl Iterator<Item = &str> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|e| e.name.eq_str(name))
            .into_iter()
            .flat_map(|e| e.values.iter())
    }

    /// All values for a name as a [`HeaderValues`] reference.
    #[inline]
    pub fn entry(&self, name: impl AsRef<str>) -> Option<&HeaderValues> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|e| e.name.eq_str(name))
            .map(|e| &e.values)
    }

    /// Check if a name is present (case-insensitive).
    #[inline]
    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.position(name.as_ref()).is_some()
    }

    /// Insert a value, replacing any values already recorded for the name.
    ///
    /// Returns the replaced values, if any. The spelling of the first
    /// insertion wins for an existing entry.
    pub fn insert(
        &mut self,
        name: impl IntoHeaderName,
        value: impl AsRef<str>,
    ) -> Result<Option<HeaderValues>, Error> {
        let name = name.into_header_name()?;
        let value = checked_value(value.as_ref())?;

        if let Some(pos) = self.position(name.as_str()) {
            let old = std::mem::replace(&mut self.entries[pos].values, HeaderValues::single(value));
            return Ok(Some(old));
        }
        self.entries.push(HeaderEntry {
            name,
            values: HeaderValues::single(value),
        });
        Ok(None)
    }

    /// Append a value, keeping existing values for the name.
    ///
    /// Use for headers that repeat (`Set-Cookie`, `Via`, ...).
    pub fn append(
        &mut self,
        name: impl IntoHeaderName,
        value: impl AsRef<str>,
    ) -> Result<(), Error> {
        let name = name.into_header_name()?;
        let value = checked_value(value.as_ref())?;

        if let Some(pos) = self.position(name.as_str()) {
            self.entries[pos].values.inner.push(value);
        } else {
            self.entries.push(HeaderEntry {
                name,
                values: HeaderValues::single(value),
            });
        }
        Ok(())
    }

    /// Remove a name and all its values (case-insensitive).
    pub fn remove(&mut self, name: impl AsRef<str>) -> Option<HeaderValues> {
        self.position(name.as_ref())
            .map(|pos| self.entries.remove(pos).values)
    }

    /// Clear all entries.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over `(name, value)` pairs; names with several values are
    /// yielded once per value.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.entries
            .iter()
            .flat_map(|e| e.values.iter().map(move |v| (&e.name, v)))
    }

    /// Iterate over `(name, values)` entries in first-insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValues)> {
        self.entries.iter().map(|e| (&e.name, &e.values))
    }

    /// Iterate over the distinct names.
    pub fn names(&self) -> impl Iterator<Item = &HeaderName> {
        self.entries.iter().map(|e| &e.name)
    }

    // ========================================================================
    // Common Header Accessors
    // ========================================================================

    /// Get `Content-Type`.
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.get(&header_name::CONTENT_TYPE)
    }

    /// Get `Content-Length` as an integer.
    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.get(&header_name::CONTENT_LENGTH)?.trim().parse().ok()
    }

    /// Get `Host`.
    #[inline]
    pub fn host(&self) -> Option<&str> {
        self.get(&header_name::HOST)
    }

    /// Check if the connection is keep-alive (HTTP/1.1 default is yes).
    #[inline]
    pub fn is_keep_alive(&self) -> bool {
        self.get(&header_name::CONNECTION)
            .map(|v| !v.eq_ignore_ascii_case("close"))
            .unwrap_or(true)
    }

    /// Check if `Transfer-Encoding` includes `chunked`.
    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.get(&header_name::TRANSFER_ENCODING)
            .map(|v| {
                v.split(',')
                    .any(|t| t.trim().eq_ignore_ascii_case("chunked"))
            })
            .unwrap_or(false)
    }
}

#[inline]
fn checked_value(value: &str) -> Result<CompactString, Error> {
    if !is_valid_header_value(value) {
        return Err(Error::InvalidHeaderValue(value.to_string()));
    }
    Ok(CompactString::new(value))
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Build a map from `(name, value)` pairs.
///
/// # Panics
///
/// Panics on an invalid name or value; use [`HeaderMap::append`] for
/// fallible construction.
impl<'a> FromIterator<(&'a str, &'a str)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.append(name, value).expect("invalid header");
        }
        map
    }
}

// Allow map-like indexing by the first value.
impl std::ops::Index<&str> for HeaderMap {
    type Output = str;

    fn index(&self, name: &str) -> &Self::Output {
        self.get(name).expect("header not found")
    }
}

// ============================================================================
// Tests
// ============================================================================
