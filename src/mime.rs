//! Extension → Content-Type Mappings
//!
//! A case-insensitive lookup table from file extensions to MIME types,
//! seeded with the common web and document types. Static-file handlers pick
//! a `Content-Type` with [`MimeMappings::for_path`]; deployments override or
//! remove entries through the builder.

use std::collections::HashMap;

use compact_str::CompactString;
use once_cell::sync::Lazy;

/// The baked-in extension table. Extensions are stored lowercase.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("aac", "audio/aac"),
    ("avi", "video/x-msvideo"),
    ("avif", "image/avif"),
    ("bin", "application/octet-stream"),
    ("bmp", "image/bmp"),
    ("bz2", "application/x-bzip2"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("eot", "application/vnd.ms-fontobject"),
    ("epub", "application/epub+zip"),
    ("flv", "video/x-flv"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/vnd.microsoft.icon"),
    ("ics", "text/calendar"),
    ("jar", "application/java-archive"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("jsonld", "application/ld+json"),
    ("md", "text/markdown"),
    ("mid", "audio/midi"),
    ("midi", "audio/midi"),
    ("mjs", "text/javascript"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("oga", "audio/ogg"),
    ("ogg", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("opus", "audio/opus"),
    ("otf", "font/otf"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("rar", "application/vnd.rar"),
    ("rtf", "application/rtf"),
    ("sh", "application/x-sh"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ts", "video/mp2t"),
    ("ttf", "font/ttf"),
    ("txt", "text/plain"),
    ("wasm", "application/wasm"),
    ("wav", "audio/wav"),
    ("weba", "audio/webm"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xhtml", "application/xhtml+xml"),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("xml", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("zip", "application/zip"),
    ("7z", "application/x-7z-compressed"),
];

static DEFAULT_TABLE: Lazy<MimeMappings> = Lazy::new(|| MimeMappings::builder().build());

/// The default table, built once.
pub fn default_mappings() -> &'static MimeMappings {
    &DEFAULT_TABLE
}

/// Case-insensitive extension → content-type table.
#[derive(Debug, Clone)]
pub struct MimeMappings {
    map: HashMap<CompactString, CompactString>,
}

impl MimeMappings {
    /// A builder seeded with the default table.
    pub fn builder() -> MimeMappingsBuilder {
        let mut map = HashMap::with_capacity(DEFAULT_MAPPINGS.len());
        for (ext, ty) in DEFAULT_MAPPINGS {
            map.insert(CompactString::const_new(ext), CompactString::const_new(ty));
        }
        MimeMappingsBuilder { map }
    }

    /// A builder with no seed entries.
    pub fn empty_builder() -> MimeMappingsBuilder {
        MimeMappingsBuilder {
            map: HashMap::new(),
        }
    }

    /// Look up an extension, any case.
    pub fn get(&self, extension: &str) -> Option<&str> {
        if extension.bytes().any(|b| b.is_ascii_uppercase()) {
            let lowered = extension.to_ascii_lowercase();
            self.map.get(lowered.as_str()).map(CompactString::as_str)
        } else {
            self.map.get(extension).map(CompactString::as_str)
        }
    }

    /// Look up the content type for a path, keyed by the extension after the
    /// last `.` of the last segment.
    pub fn for_path(&self, path: &str) -> Option<&str> {
        let segment = match path.rfind('/') {
            Some(i) => &path[i + 1..],
            None => path,
        };
        let (_, extension) = segment.rsplit_once('.')?;
        self.get(extension)
    }

    /// Number of mapped extensions.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for MimeMappings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`MimeMappings`].
#[derive(Debug, Clone)]
pub struct MimeMappingsBuilder {
    map: HashMap<CompactString, CompactString>,
}

impl MimeMappingsBuilder {
    /// Map an extension, replacing any existing entry.
    pub fn add(mut self, extension: &str, content_type: &str) -> Self {
        let key = if extension.bytes().any(|b| b.is_ascii_uppercase()) {
            CompactString::new(extension.to_ascii_lowercase())
        } else {
            CompactString::new(extension)
        };
        self.map.insert(key, CompactString::new(content_type));
        self
    }

    /// Remove an extension.
    pub fn omit(mut self, extension: &str) -> Self {
        if extension.bytes().any(|b| b.is_ascii_uppercase()) {
            self.map.remove(extension.to_ascii_lowercase().as_str());
        } else {
            self.map.remove(extension);
        }
        self
    }

    pub fn build(self) -> MimeMappings {
        MimeMappings { map: self.map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        let mappings = default_mappings();
        assert_eq!(mappings.get("html"), Some("text/html"));
        assert_eq!(mappings.get("json"), Some("application/json"));
        assert_eq!(mappings.get("woff2"), Some("font/woff2"));
        assert_eq!(mappings.get("nonesuch"), None);
    }

    #[test]
    fn test_case_insensitive_extension() {
        let mappings = default_mappings();
        assert_eq!(mappings.get("PNG"), Some("image/png"));
        assert_eq!(mappings.get("Svg"), Some("image/svg+xml"));
    }

    #[test]
    fn test_for_path() {
        let mappings = default_mappings();
        assert_eq!(mappings.for_path("/static/app.css"), Some("text/css"));
        assert_eq!(mappings.for_path("/a/b/archive.tar.gz"), Some("application/gzip"));
        assert_eq!(mappings.for_path("README"), None);
        assert_eq!(mappings.for_path("/dir.with.dots/plain"), None);
        assert_eq!(mappings.for_path("/trailing."), None);
        assert_eq!(mappings.for_path("/.hidden"), None);
        assert_eq!(mappings.for_path("INDEX.HTML"), Some("text/html"));
    }

    #[test]
    fn test_override_and_omit() {
        let mappings = MimeMappings::builder()
            .add("js", "application/javascript")
            .add("custom", "application/x-custom")
            .omit("swf")
            .omit("flv")
            .build();

        assert_eq!(mappings.get("js"), Some("application/javascript"));
        assert_eq!(mappings.get("custom"), Some("application/x-custom"));
        assert_eq!(mappings.get("flv"), None);
        // Untouched defaults survive.
        assert_eq!(mappings.get("png"), Some("image/png"));
    }

    #[test]
    fn test_empty_builder() {
        let mappings = MimeMappings::empty_builder().add("x", "text/x").build();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings.get("html"), None);
        assert_eq!(mappings.get("x"), Some("text/x"));
    }
}
