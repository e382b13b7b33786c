//! `META-INF/container.xml` parsing
//!
//! The container document maps the archive to its package document. Only
//! rootfiles declared with the package-document media type are considered.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::archive::EpubArchive;
use crate::error::EpubError;
use crate::media_types::PACKAGE_DOCUMENT_MEDIA_TYPE;
use crate::xml::parse_document;

/// Fixed archive path of the container document.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// OCF container namespace.
pub const CONTAINER_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";

/// One `<rootfile>` declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RootfileReference {
    /// `full-path` attribute
    pub full_path: Option<String>,
    /// `media-type` attribute
    pub media_type: Option<String>,
}

/// Parsed container document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ContainerDocument {
    /// Rootfiles in document order
    pub rootfiles: Vec<RootfileReference>,
}

impl ContainerDocument {
    /// Parse container document bytes.
    ///
    /// Fails with [`EpubError::Encoding`] on invalid UTF-8,
    /// [`EpubError::MalformedDocument`] on bad XML and
    /// [`EpubError::ReferenceNotFound`] when there is no `<rootfiles>` element.
    pub fn parse(content: &[u8]) -> Result<Self, EpubError> {
        let text = core::str::from_utf8(content).map_err(|e| {
            EpubError::Encoding(format!("failed to decode '{}' as UTF-8: {}", CONTAINER_PATH, e))
        })?;
        let root = parse_document(text)?;

        let rootfiles = root.find(CONTAINER_NS, "rootfiles").ok_or_else(|| {
            EpubError::ReferenceNotFound(format!("no <rootfiles> element in '{}'", CONTAINER_PATH))
        })?;

        let rootfiles = rootfiles
            .find_all(CONTAINER_NS, "rootfile")
            .map(|rootfile| RootfileReference {
                full_path: rootfile.attr("full-path").map(str::to_string),
                media_type: rootfile.attr("media-type").map(str::to_string),
            })
            .collect();

        Ok(Self { rootfiles })
    }

    /// `full-path` of the first rootfile declaring the package-document media type.
    pub fn package_document_path(&self) -> Option<&str> {
        self.rootfiles
            .iter()
            .filter(|r| r.media_type.as_deref() == Some(PACKAGE_DOCUMENT_MEDIA_TYPE))
            .filter_map(|r| r.full_path.as_deref())
            .find(|path| !path.is_empty())
    }
}

/// Find the package document path through `META-INF/container.xml`.
pub fn locate_package_document<A: EpubArchive + ?Sized>(
    archive: &mut A,
) -> Result<String, EpubError> {
    if !archive.contains(CONTAINER_PATH) {
        return Err(EpubError::MissingResource(format!(
            "missing '{}' in EPUB file",
            CONTAINER_PATH
        )));
    }
    let content = archive.read_entry(CONTAINER_PATH)?;
    let container = ContainerDocument::parse(&content)?;

    let path = container.package_document_path().ok_or_else(|| {
        EpubError::ReferenceNotFound(format!(
            "no rootfile with media-type '{}' in '{}'",
            PACKAGE_DOCUMENT_MEDIA_TYPE, CONTAINER_PATH
        ))
    })?;
    log::info!("EPUB rootfile found: {}", path);
    Ok(path.to_string())
}
