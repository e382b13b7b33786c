//! `<manifest>` extraction and the id lookup the spine resolves against.

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::advisory::{Advisory, MANIFEST_MEDIA_TYPE_DEPRECATED, MANIFEST_MEDIA_TYPE_UNKNOWN};
use crate::error::EpubError;
use crate::media_types::MediaTypeTables;
use crate::package::OPF_NS;
use crate::xml::XmlElement;

/// A single item in the manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ManifestItem {
    /// Resource identifier
    pub id: String,
    /// Path relative to the package document
    pub href: String,
    /// Declared media type
    pub media_type: String,
    /// Id of the item to use when this one cannot be rendered
    pub fallback: Option<String>,
    /// Id of a stylesheet fallback
    pub fallback_style: Option<String>,
    /// Namespace an out-of-line XML island requires
    pub required_namespace: Option<String>,
    /// Modules an out-of-line XML island requires
    pub required_modules: Option<String>,
}

/// Extract every `<item>` of `<manifest>`, in document order.
///
/// Media types outside `tables` are reported through `advisories` and do
/// not stop the parse. Duplicate ids are left to [`ManifestLookup`].
pub fn parse_manifest(
    package: &XmlElement,
    tables: &MediaTypeTables,
    advisories: &mut Vec<Advisory>,
) -> Result<Vec<ManifestItem>, EpubError> {
    let manifest = package
        .find(OPF_NS, "manifest")
        .ok_or_else(|| EpubError::Structural("missing <manifest> section in OPF file".into()))?;

    let mut items = Vec::new();
    let mut hrefs = BTreeSet::new();

    for element in manifest.find_all(OPF_NS, "item") {
        let item = ManifestItem {
            id: required_attr(element, "id")?,
            href: required_attr(element, "href")?,
            media_type: required_attr(element, "media-type")?,
            fallback: element.attr("fallback").map(str::to_string),
            fallback_style: element.attr("fallback-style").map(str::to_string),
            required_namespace: element.attr("required-namespace").map(str::to_string),
            required_modules: element.attr("required-modules").map(str::to_string),
        };

        if !hrefs.insert(item.href.clone()) {
            return Err(EpubError::DuplicateKey(format!(
                "duplicate href '{}' in <manifest>",
                item.href
            )));
        }

        if !tables.is_recognized(&item.media_type) {
            media_type_advisory(&item, tables).emit(advisories);
        }

        items.push(item);
    }

    log::info!("Manifest items: {}", items.len());
    Ok(items)
}

fn required_attr(element: &XmlElement, name: &str) -> Result<String, EpubError> {
    element
        .non_empty_attr(name)
        .map(str::to_string)
        .ok_or_else(|| EpubError::Structural(format!("missing '{}' attribute in <item>", name)))
}

fn media_type_advisory(item: &ManifestItem, tables: &MediaTypeTables) -> Advisory {
    let mut advisory = match tables.suggested_replacement(&item.media_type) {
        Some(suggestion) => {
            let mut a = Advisory::new(
                MANIFEST_MEDIA_TYPE_DEPRECATED,
                format!(
                    "deprecated media-type '{}' in <item> with id '{}'; consider using '{}' instead",
                    item.media_type, item.id, suggestion
                ),
            );
            a.suggestion = Some(suggestion.to_string());
            a
        }
        None => Advisory::new(
            MANIFEST_MEDIA_TYPE_UNKNOWN,
            format!(
                "unknown media-type '{}' in <item> with id '{}'",
                item.media_type, item.id
            ),
        ),
    };
    advisory.item_id = Some(item.id.clone());
    advisory.media_type = Some(item.media_type.clone());
    advisory
}

/// Manifest items keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestLookup<'a> {
    by_id: BTreeMap<&'a str, &'a ManifestItem>,
}

impl<'a> ManifestLookup<'a> {
    /// Index `items` by id, rejecting ids declared more than once.
    pub fn new(items: &'a [ManifestItem]) -> Result<Self, EpubError> {
        let mut by_id = BTreeMap::new();
        for item in items {
            if by_id.insert(item.id.as_str(), item).is_some() {
                return Err(EpubError::DuplicateKey(format!(
                    "duplicate id '{}' in <manifest>",
                    item.id
                )));
            }
        }
        Ok(Self { by_id })
    }

    /// Item with the given id.
    pub fn get(&self, id: &str) -> Option<&'a ManifestItem> {
        self.by_id.get(id).copied()
    }

    /// `true` if an item has the given id.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// `true` when the manifest has no items.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
