//! Longest-Prefix Path Matching
//!
//! Dispatches a request path to the handler mounted at its longest
//! matching prefix. Two tables back the lookup: exact paths answer in one
//! hash probe, and prefix paths are tried longest first, only at segment
//! boundaries, so `/foo` claims `/foo/bar` but never `/foobar`.
//!
//! The match reports the consumed prefix and the unconsumed remainder;
//! nested routers re-dispatch on the remainder.
//!
//! # Example
//!
//! ```rust
//! use gusset::path_matcher::PathMatcher;
//!
//! let mut matcher = PathMatcher::new();
//! matcher.add_prefix("/", "root");
//! matcher.add_prefix("/api", "api");
//! matcher.add_exact("/health", "health");
//!
//! let hit = matcher.match_path("/api/users/42").unwrap();
//! assert_eq!(*hit.value, "api");
//! assert_eq!(hit.remaining, "/users/42");
//! ```

use std::collections::HashMap;

use compact_str::CompactString;

/// A successful prefix or exact match.
#[derive(Debug, PartialEq, Eq)]
pub struct PathMatch<'a, T> {
    /// The consumed part of the path.
    pub matched: &'a str,
    /// The rest of the path, empty or starting with `/`.
    pub remaining: &'a str,
    /// The mounted value.
    pub value: &'a T,
}

/// Longest-prefix path dispatcher.
#[derive(Debug, Default)]
pub struct PathMatcher<T> {
    exact: HashMap<CompactString, T>,
    prefixes: HashMap<CompactString, T>,
    /// Distinct prefix lengths, longest first.
    lengths: Vec<usize>,
    /// Value mounted at `/`, the fallback for everything.
    root: Option<T>,
}

impl<T> PathMatcher<T> {
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: HashMap::new(),
            lengths: Vec::new(),
            root: None,
        }
    }

    /// Mount a value at an exact path. Replaces any previous value there.
    pub fn add_exact(&mut self, path: impl AsRef<str>, value: T) -> Option<T> {
        self.exact.insert(normalize(path.as_ref()), value)
    }

    /// Mount a value at a path prefix. `/` becomes the fallback for paths
    /// nothing else claims. Returns the value it replaces, if any.
    pub fn add_prefix(&mut self, path: impl AsRef<str>, value: T) -> Option<T> {
        let path = normalize(path.as_ref());
        if path == "/" {
            return self.root.replace(value);
        }
        let replaced = self.prefixes.insert(path.clone(), value);
        if replaced.is_none() {
            self.rebuild_lengths();
        }
        replaced
    }

    /// Unmount an exact path.
    pub fn remove_exact(&mut self, path: impl AsRef<str>) -> Option<T> {
        self.exact.remove(normalize(path.as_ref()).as_str())
    }

    /// Unmount a prefix path.
    pub fn remove_prefix(&mut self, path: impl AsRef<str>) -> Option<T> {
        let path = normalize(path.as_ref());
        if path == "/" {
            return self.root.take();
        }
        let removed = self.prefixes.remove(path.as_str());
        if removed.is_some() {
            self.rebuild_lengths();
        }
        removed
    }

    /// Look up the value mounted at a prefix, without matching.
    pub fn get_prefix(&self, path: impl AsRef<str>) -> Option<&T> {
        let path = normalize(path.as_ref());
        if path == "/" {
            return self.root.as_ref();
        }
        self.prefixes.get(path.as_str())
    }

    /// Match a path to its most specific mount.
    ///
    /// Exact mounts win outright; then prefixes longest-first at segment
    /// boundaries; then the `/` fallback.
    pub fn match_path<'a>(&'a self, path: &'a str) -> Option<PathMatch<'a, T>> {
        if let Some(value) = self.exact.get(path) {
            return Some(PathMatch {
                matched: path,
                remaining: "",
                value,
            });
        }

        for &length in &self.lengths {
            if length > path.len() {
                continue;
            }
            // A prefix only matches whole segments.
            if length < path.len() && path.as_bytes()[length] != b'/' {
                continue;
            }
            if let Some(value) = self.prefixes.get(&path[..length]) {
                return Some(PathMatch {
                    matched: &path[..length],
                    remaining: &path[length..],
                    value,
                });
            }
        }

        self.root.as_ref().map(|value| PathMatch {
            matched: "/",
            remaining: path,
            value,
        })
    }

    fn rebuild_lengths(&mut self) {
        let mut lengths: Vec<usize> = self.prefixes.keys().map(|k| k.len()).collect();
        lengths.sort_unstable_by(|a, b| b.cmp(a));
        lengths.dedup();
        self.lengths = lengths;
    }
}

/// Strip a trailing `/`, except from `/` itself.
fn normalize(path: &str) -> CompactString {
    if path.len() > 1 && path.ends_with('/') {
        CompactString::new(&path[..path.len() - 1])
    } else {
        CompactString::new(path)
    }
}
