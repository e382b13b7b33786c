//! Media-type tables used by the manifest and spine stages.
//!
//! Passed explicitly into each stage, so callers and tests can swap in
//! alternate tables.

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};

/// Media type of the package document, as declared in `container.xml`.
pub const PACKAGE_DOCUMENT_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Exact content of the `mimetype` entry.
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

const RECOGNIZED: &[&str] = &[
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "application/xhtml+xml",
    "application/x-dtbook+xml",
    "text/css",
    "application/xml",
    "application/x-dtbncx+xml",
    "application/vnd.ms-opentype",
];

const DEPRECATED: &[(&str, Option<&str>)] = &[
    ("application/x-font-ttf", Some("application/vnd.ms-opentype")),
    ("application/vnd.adobe-page-template+xml", None),
];

const CONTENT_DOCUMENTS: &[&str] = &[
    "application/xhtml+xml",
    "application/x-dtbook+xml",
    "text/x-oeb1-document",
];

/// Recognized, deprecated and content-document media types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaTypeTables {
    recognized: BTreeSet<String>,
    deprecated: BTreeMap<String, Option<String>>,
    content_documents: BTreeSet<String>,
}

impl Default for MediaTypeTables {
    fn default() -> Self {
        Self {
            recognized: RECOGNIZED.iter().map(|s| s.to_string()).collect(),
            deprecated: DEPRECATED
                .iter()
                .map(|(ty, suggestion)| (ty.to_string(), suggestion.map(str::to_string)))
                .collect(),
            content_documents: CONTENT_DOCUMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MediaTypeTables {
    /// Tables with nothing recognized, deprecated or eligible.
    pub fn empty() -> Self {
        Self {
            recognized: BTreeSet::new(),
            deprecated: BTreeMap::new(),
            content_documents: BTreeSet::new(),
        }
    }

    /// Add a recognized media type.
    pub fn with_recognized(mut self, media_type: &str) -> Self {
        self.recognized.insert(media_type.to_string());
        self
    }

    /// Declare `media_type` deprecated, optionally naming its replacement.
    pub fn with_deprecated(mut self, media_type: &str, suggestion: Option<&str>) -> Self {
        self.deprecated
            .insert(media_type.to_string(), suggestion.map(str::to_string));
        self
    }

    /// Add a media type eligible as direct spine content.
    pub fn with_content_document(mut self, media_type: &str) -> Self {
        self.content_documents.insert(media_type.to_string());
        self
    }

    /// `true` if `media_type` is in the recognized set.
    pub fn is_recognized(&self, media_type: &str) -> bool {
        self.recognized.contains(media_type)
    }

    /// Suggested replacement for a deprecated media type.
    ///
    /// `None` both for types that are not deprecated and for deprecated
    /// types without a known replacement.
    pub fn suggested_replacement(&self, media_type: &str) -> Option<&str> {
        self.deprecated.get(media_type).and_then(|s| s.as_deref())
    }

    /// `true` if `media_type` may be referenced directly from the spine.
    pub fn is_content_document(&self, media_type: &str) -> bool {
        self.content_documents.contains(media_type)
    }

    /// Recognized media types, sorted.
    pub fn recognized(&self) -> impl Iterator<Item = &str> {
        self.recognized.iter().map(String::as_str)
    }
}
