//! `<metadata>` extraction
//!
//! Collects the Dublin Core elements and `<meta>` entries of a package
//! document, then checks that the package's `unique-identifier` names one of
//! the declared `<dc:identifier>` elements.

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::advisory::{Advisory, OPF_METADATA_MISSING};
use crate::error::EpubError;
use crate::package::{DC_NS, OPF_NS};
use crate::xml::XmlElement;

/// A `<dc:identifier>` entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Identifier {
    /// `id` attribute, the key `unique-identifier` refers to
    pub id: Option<String>,
    /// `opf:scheme` attribute (e.g. "ISBN", "UUID")
    pub scheme: Option<String>,
    /// Identifier value
    pub value: String,
}

/// A `<dc:creator>` entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Creator {
    /// Display name
    pub name: String,
    /// `opf:role` MARC relator code (e.g. "aut")
    pub role: Option<String>,
    /// `opf:file-as` sort form
    pub file_as: Option<String>,
}

/// A `<dc:date>` entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DateEntry {
    /// Date text as written
    pub date: String,
    /// `opf:event` (e.g. "publication", "modification")
    pub event: Option<String>,
}

/// A `<meta>` entry, EPUB 2 (`name`/`content`) or EPUB 3 (`property`) style.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetaEntry {
    /// `name` attribute (EPUB 2)
    pub name: Option<String>,
    /// `content` attribute (EPUB 2)
    pub content: Option<String>,
    /// `scheme` attribute
    pub scheme: Option<String>,
    /// `property` attribute (EPUB 3)
    pub property: Option<String>,
    /// Element text
    pub value: Option<String>,
}

/// Everything declared in `<metadata>`, each category in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetadataRecord {
    /// Titles (dc:title)
    pub titles: Vec<String>,
    /// Identifiers (dc:identifier)
    pub identifiers: Vec<Identifier>,
    /// Language codes (dc:language)
    pub languages: Vec<String>,
    /// Creators (dc:creator)
    pub creators: Vec<Creator>,
    /// Publishers (dc:publisher)
    pub publishers: Vec<String>,
    /// Dates (dc:date)
    pub dates: Vec<DateEntry>,
    /// Subject tags (dc:subject)
    pub subjects: Vec<String>,
    /// Descriptions (dc:description)
    pub descriptions: Vec<String>,
    /// Rights statements (dc:rights)
    pub rights: Vec<String>,
    /// `<meta>` entries in any namespace
    pub meta: Vec<MetaEntry>,
}

impl MetadataRecord {
    /// Non-empty identifier ids.
    pub fn identifier_ids(&self) -> BTreeSet<&str> {
        self.identifiers
            .iter()
            .filter_map(|i| i.id.as_deref())
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Identifier whose id is `id`.
    pub fn identifier(&self, id: &str) -> Option<&Identifier> {
        self.identifiers
            .iter()
            .find(|i| i.id.as_deref() == Some(id))
    }

    /// First title, if any.
    pub fn title(&self) -> Option<&str> {
        self.titles.first().map(String::as_str)
    }
}

/// Extract `<metadata>` from a package root and check the unique identifier.
///
/// A package without `<metadata>` yields `Ok(None)` and an
/// [`OPF_METADATA_MISSING`] advisory, since the rest of the package can
/// still be inspected.
pub fn parse_metadata(
    package: &XmlElement,
    unique_identifier: &str,
    advisories: &mut Vec<Advisory>,
) -> Result<Option<MetadataRecord>, EpubError> {
    let Some(metadata) = package.find(OPF_NS, "metadata") else {
        Advisory::new(OPF_METADATA_MISSING, "missing <metadata> section in OPF file")
            .emit(advisories);
        return Ok(None);
    };

    let record = MetadataRecord {
        titles: dc_texts(metadata, "title"),
        identifiers: metadata
            .find_all(DC_NS, "identifier")
            .map(|e| Identifier {
                id: e.attr("id").map(str::to_string),
                scheme: e.attr_ns(OPF_NS, "scheme").map(str::to_string),
                value: e.text().to_string(),
            })
            .collect(),
        languages: dc_texts(metadata, "language"),
        creators: metadata
            .find_all(DC_NS, "creator")
            .map(|e| Creator {
                name: e.text().to_string(),
                role: e.attr_ns(OPF_NS, "role").map(str::to_string),
                file_as: e.attr_ns(OPF_NS, "file-as").map(str::to_string),
            })
            .collect(),
        publishers: dc_texts(metadata, "publisher"),
        dates: metadata
            .find_all(DC_NS, "date")
            .map(|e| DateEntry {
                date: e.text().to_string(),
                event: e.attr_ns(OPF_NS, "event").map(str::to_string),
            })
            .collect(),
        subjects: dc_texts(metadata, "subject"),
        descriptions: dc_texts(metadata, "description"),
        rights: dc_texts(metadata, "rights"),
        meta: metadata
            .children()
            .iter()
            .filter(|e| e.local_name() == "meta")
            .map(|e| MetaEntry {
                name: e.attr("name").map(str::to_string),
                content: e.attr("content").map(str::to_string),
                scheme: e.attr("scheme").map(str::to_string),
                property: e.attr("property").map(str::to_string),
                value: e.text_opt().map(str::to_string),
            })
            .collect(),
    };

    if !record.identifier_ids().contains(unique_identifier) {
        return Err(EpubError::ReferenceNotFound(format!(
            "unique-identifier '{}' does not match any <dc:identifier> id",
            unique_identifier
        )));
    }
    log::info!(
        "unique-identifier '{}' matches <dc:identifier> id",
        unique_identifier
    );

    Ok(Some(record))
}

fn dc_texts(metadata: &XmlElement, local_name: &str) -> Vec<String> {
    metadata
        .find_all(DC_NS, local_name)
        .map(|e| e.text().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    type Parsed = (Result<Option<MetadataRecord>, EpubError>, Vec<Advisory>);

    fn parse(opf: &str, unique_identifier: &str) -> Parsed {
        let root = parse_document(opf).unwrap();
        let mut advisories = Vec::new();
        let result = parse_metadata(&root, unique_identifier, &mut advisories);
        (result, advisories)
    }

    #[test]
    fn test_all_dublin_core_fields() {
        let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Main Title</dc:title>
    <dc:title>Subtitle</dc:title>
    <dc:identifier id="BookId" opf:scheme="ISBN">978-3-16-148410-0</dc:identifier>
    <dc:identifier opf:scheme="UUID">urn:uuid:1234</dc:identifier>
    <dc:language>en</dc:language>
    <dc:creator opf:role="aut" opf:file-as="Doe, Jane">Jane Doe</dc:creator>
    <dc:creator>Anonymous</dc:creator>
    <dc:publisher>Acme Publishing</dc:publisher>
    <dc:date opf:event="publication">2024-01-15</dc:date>
    <dc:subject>Fiction</dc:subject>
    <dc:subject>Testing</dc:subject>
    <dc:description>A story about parsers &amp; archives.</dc:description>
    <dc:rights>Copyright 2024</dc:rights>
    <meta name="cover" content="cover-image"/>
    <meta property="dcterms:modified">2024-02-01T00:00:00Z</meta>
  </metadata>
</package>"#;
        let (result, advisories) = parse(opf, "BookId");
        let record = result.unwrap().unwrap();
        assert!(advisories.is_empty());

        assert_eq!(record.titles, vec!["Main Title", "Subtitle"]);
        assert_eq!(record.title(), Some("Main Title"));
        assert_eq!(record.identifiers.len(), 2);
        assert_eq!(
            record.identifier("BookId"),
            Some(&Identifier {
                id: Some("BookId".into()),
                scheme: Some("ISBN".into()),
                value: "978-3-16-148410-0".into(),
            })
        );
        assert_eq!(record.identifiers[1].id, None);
        assert_eq!(record.languages, vec!["en"]);
        assert_eq!(record.creators[0].role.as_deref(), Some("aut"));
        assert_eq!(record.creators[0].file_as.as_deref(), Some("Doe, Jane"));
        assert_eq!(record.creators[1].name, "Anonymous");
        assert_eq!(record.creators[1].role, None);
        assert_eq!(record.publishers, vec!["Acme Publishing"]);
        assert_eq!(record.dates[0].event.as_deref(), Some("publication"));
        assert_eq!(record.subjects, vec!["Fiction", "Testing"]);
        assert_eq!(record.descriptions, vec!["A story about parsers & archives."]);
        assert_eq!(record.rights, vec!["Copyright 2024"]);

        assert_eq!(record.meta.len(), 2);
        assert_eq!(record.meta[0].name.as_deref(), Some("cover"));
        assert_eq!(record.meta[0].content.as_deref(), Some("cover-image"));
        assert_eq!(record.meta[0].value, None);
        assert_eq!(record.meta[1].property.as_deref(), Some("dcterms:modified"));
        assert_eq!(record.meta[1].value.as_deref(), Some("2024-02-01T00:00:00Z"));
    }

    #[test]
    fn test_field_text_stops_at_first_child_element() {
        let opf = r#"<package xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="BookId">urn:isbn:123</dc:identifier>
    <dc:title>A<dc:x/>B</dc:title>
    <dc:creator>Jane <dc:x/>Doe</dc:creator>
  </metadata>
</package>"#;
        let (result, _) = parse(opf, "BookId");
        let record = result.unwrap().unwrap();
        assert_eq!(record.titles, vec!["A"]);
        assert_eq!(record.creators[0].name, "Jane");
    }

    #[test]
    fn test_unique_identifier_must_match_an_identifier_id() {
        let opf = r#"<package xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="BookId">urn:isbn:123</dc:identifier>
  </metadata>
</package>"#;
        let (result, _) = parse(opf, "BookId2");
        let err = result.unwrap_err();
        assert!(matches!(err, EpubError::ReferenceNotFound(ref m) if m.contains("BookId2")));
    }

    #[test]
    fn test_empty_identifier_id_does_not_match() {
        let opf = r#"<package xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="">urn:isbn:123</dc:identifier>
  </metadata>
</package>"#;
        let (result, _) = parse(opf, "");
        assert!(matches!(result, Err(EpubError::ReferenceNotFound(_))));
    }

    #[test]
    fn test_identifier_in_wrong_namespace_is_ignored() {
        let opf = r#"<package xmlns="http://www.idpf.org/2007/opf">
  <metadata>
    <identifier id="BookId">urn:isbn:123</identifier>
  </metadata>
</package>"#;
        let (result, _) = parse(opf, "BookId");
        assert!(matches!(result, Err(EpubError::ReferenceNotFound(_))));
    }

    #[test]
    fn test_missing_metadata_is_advisory() {
        let opf = r#"<package xmlns="http://www.idpf.org/2007/opf"><manifest/></package>"#;
        let (result, advisories) = parse(opf, "BookId");
        assert_eq!(result, Ok(None));
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].code, OPF_METADATA_MISSING);
    }

    #[test]
    fn test_metadata_must_be_direct_child() {
        let opf = r#"<package xmlns="http://www.idpf.org/2007/opf">
  <wrapper><metadata/></wrapper>
</package>"#;
        let (result, advisories) = parse(opf, "BookId");
        assert_eq!(result, Ok(None));
        assert_eq!(advisories.len(), 1);
    }
}
