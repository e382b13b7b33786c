//! EPUB spine parser
//!
//! The spine defines the reading order. Each `<itemref>` must resolve to a
//! manifest item that is a content document, either directly or through the
//! item's `fallback` (one hop, never followed further).

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::EpubError;
use crate::manifest::{ManifestItem, ManifestLookup};
use crate::media_types::MediaTypeTables;
use crate::package::OPF_NS;
use crate::xml::XmlElement;

/// A single `<itemref>`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpineItemRef {
    /// Manifest item this entry references
    pub idref: String,
    /// `true` unless `linear` is anything other than "yes"
    pub linear: bool,
}

impl SpineItemRef {
    /// `linear` as written in the package format.
    pub fn linear_value(&self) -> &'static str {
        if self.linear {
            "yes"
        } else {
            "no"
        }
    }
}

/// Reading order split into primary and auxiliary content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Spine {
    /// Manifest id of the NCX table of contents
    pub toc_id: String,
    /// Linear entries in document order
    pub primary: Vec<SpineItemRef>,
    /// Non-linear entries in document order
    pub auxiliary: Vec<SpineItemRef>,
}

impl Spine {
    /// Total number of itemrefs.
    pub fn len(&self) -> usize {
        self.primary.len() + self.auxiliary.len()
    }

    /// `true` when the spine has no itemrefs.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.auxiliary.is_empty()
    }
}

/// Extract `<spine>` and resolve each itemref against `manifest`.
pub fn parse_spine(
    package: &XmlElement,
    manifest: &ManifestLookup<'_>,
    tables: &MediaTypeTables,
) -> Result<Spine, EpubError> {
    let spine = package
        .find(OPF_NS, "spine")
        .ok_or_else(|| EpubError::Structural("missing <spine> section in OPF file".into()))?;

    let toc_id = spine
        .non_empty_attr("toc")
        .ok_or_else(|| {
            EpubError::Structural("the <spine> element is missing the 'toc' attribute".into())
        })?
        .to_string();
    log::info!("Table of contents id: {}", toc_id);

    let mut result = Spine {
        toc_id,
        ..Spine::default()
    };
    let mut seen = BTreeSet::new();

    for itemref in spine.find_all(OPF_NS, "itemref") {
        let idref = itemref
            .non_empty_attr("idref")
            .ok_or_else(|| EpubError::Structural("<itemref> missing 'idref' attribute".into()))?;

        if !seen.insert(idref) {
            return Err(EpubError::DuplicateKey(format!(
                "duplicate idref '{}' in <spine>",
                idref
            )));
        }

        let item = manifest.get(idref).ok_or_else(|| {
            EpubError::ReferenceNotFound(format!(
                "idref '{}' in <itemref> does not reference any manifest item",
                idref
            ))
        })?;

        if !is_content_document(item, manifest, tables) {
            return Err(EpubError::ReferenceNotFound(format!(
                "itemref '{}' does not reference a content document, even with fallback",
                idref
            )));
        }

        let entry = SpineItemRef {
            idref: idref.to_string(),
            linear: itemref.attr("linear").unwrap_or("yes") == "yes",
        };
        if entry.linear {
            result.primary.push(entry);
        } else {
            result.auxiliary.push(entry);
        }
    }

    log::info!(
        "Spine: {} primary, {} auxiliary",
        result.primary.len(),
        result.auxiliary.len()
    );
    Ok(result)
}

fn is_content_document(
    item: &ManifestItem,
    manifest: &ManifestLookup<'_>,
    tables: &MediaTypeTables,
) -> bool {
    if tables.is_content_document(&item.media_type) {
        return true;
    }
    item.fallback
        .as_deref()
        .and_then(|id| manifest.get(id))
        .is_some_and(|fallback| tables.is_content_document(&fallback.media_type))
}
