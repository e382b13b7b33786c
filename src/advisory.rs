//! Non-fatal findings collected while parsing a package document.

extern crate alloc;

use alloc::string::String;

/// Manifest item declares a deprecated media type that has a replacement.
pub const MANIFEST_MEDIA_TYPE_DEPRECATED: &str = "MANIFEST_MEDIA_TYPE_DEPRECATED";
/// Manifest item declares a media type outside the recognized set.
pub const MANIFEST_MEDIA_TYPE_UNKNOWN: &str = "MANIFEST_MEDIA_TYPE_UNKNOWN";
/// Package document has no `<metadata>` element.
pub const OPF_METADATA_MISSING: &str = "OPF_METADATA_MISSING";

/// A warning that did not stop the run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Advisory {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Manifest item the advisory is about.
    pub item_id: Option<String>,
    /// Media type the advisory is about.
    pub media_type: Option<String>,
    /// Suggested replacement value.
    pub suggestion: Option<String>,
}

impl Advisory {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            item_id: None,
            media_type: None,
            suggestion: None,
        }
    }

    /// Record this advisory on the log and append it to `advisories`.
    pub(crate) fn emit(self, advisories: &mut alloc::vec::Vec<Advisory>) {
        log::warn!("{}", self.message);
        advisories.push(self);
    }
}
