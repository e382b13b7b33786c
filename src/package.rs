//! Package document (OPF) orchestration
//!
//! The package text is parsed once. Identity, metadata, manifest, spine and
//! guide are then extracted from the shared tree in that order, and the
//! first failing stage ends the run.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::advisory::Advisory;
use crate::error::{EpubError, Stage, StageError};
use crate::guide::{parse_guide, GuideReference};
use crate::manifest::{parse_manifest, ManifestItem, ManifestLookup};
use crate::media_types::MediaTypeTables;
use crate::metadata::{parse_metadata, MetadataRecord};
use crate::spine::{parse_spine, Spine};
use crate::xml::{parse_document, XmlElement};

/// OPF package namespace.
pub const OPF_NS: &str = "http://www.idpf.org/2007/opf";

/// Dublin Core elements namespace.
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// Version and unique-identifier key from the `<package>` root.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackageIdentity {
    /// `version` attribute, verbatim
    pub version: String,
    /// `unique-identifier` attribute: the id of a `<dc:identifier>`, not its value
    pub unique_identifier: String,
}

/// Check the package root and read its identity attributes.
pub fn parse_package_identity(package: &XmlElement) -> Result<PackageIdentity, EpubError> {
    if !package.is(OPF_NS, "package") {
        return Err(EpubError::Structural(format!(
            "root element is '{}', expected '{{{}}}package'",
            package.qualified_name(),
            OPF_NS
        )));
    }

    let version = package.non_empty_attr("version").ok_or_else(|| {
        EpubError::Structural("missing 'version' attribute in <package> element".into())
    })?;
    log::info!("OPF version: {}", version);

    let unique_identifier = package.non_empty_attr("unique-identifier").ok_or_else(|| {
        EpubError::Structural("missing 'unique-identifier' attribute in <package> element".into())
    })?;
    log::info!("OPF unique identifier: {}", unique_identifier);

    Ok(PackageIdentity {
        version: version.to_string(),
        unique_identifier: unique_identifier.to_string(),
    })
}

/// Fully parsed package document.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackageDocument {
    /// Version and unique-identifier key
    pub identity: PackageIdentity,
    /// `None` when the package has no `<metadata>` element
    pub metadata: Option<MetadataRecord>,
    /// Manifest items in document order
    pub manifest: Vec<ManifestItem>,
    /// Reading order
    pub spine: Spine,
    /// Guide references in document order
    pub guide: Vec<GuideReference>,
}

impl PackageDocument {
    /// Get manifest item by id
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Value of the identifier the package designates as unique.
    pub fn unique_identifier_value(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.identifier(&self.identity.unique_identifier))
            .map(|i| i.value.as_str())
    }
}

/// A package document plus the advisories raised while parsing it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParsedPackage {
    /// The parsed document
    pub document: PackageDocument,
    /// Advisories in the order they were raised
    pub advisories: Vec<Advisory>,
}

/// Parse package document text.
///
/// Malformed XML is reported at the identity stage, which is the first to
/// need the tree.
pub fn parse_package(text: &str, tables: &MediaTypeTables) -> Result<ParsedPackage, StageError> {
    let root = parse_document(text).map_err(|e| StageError::new(Stage::Identity, e))?;
    parse_package_tree(&root, tables)
}

/// Run every package stage against an already parsed tree.
pub fn parse_package_tree(
    root: &XmlElement,
    tables: &MediaTypeTables,
) -> Result<ParsedPackage, StageError> {
    let mut advisories = Vec::new();

    let identity = parse_package_identity(root).map_err(|e| StageError::new(Stage::Identity, e))?;

    let metadata = parse_metadata(root, &identity.unique_identifier, &mut advisories)
        .map_err(|e| StageError::new(Stage::Metadata, e))?;

    let manifest = parse_manifest(root, tables, &mut advisories)
        .map_err(|e| StageError::new(Stage::Manifest, e))?;
    let lookup = ManifestLookup::new(&manifest).map_err(|e| StageError::new(Stage::Manifest, e))?;

    let spine = parse_spine(root, &lookup, tables).map_err(|e| StageError::new(Stage::Spine, e))?;

    let guide = parse_guide(root).map_err(|e| StageError::new(Stage::Guide, e))?;

    Ok(ParsedPackage {
        document: PackageDocument {
            identity,
            metadata,
            manifest,
            spine,
            guide,
        },
        advisories,
    })
}
