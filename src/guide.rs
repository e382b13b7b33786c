//! EPUB 2 `<guide>` references.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::EpubError;
use crate::package::OPF_NS;
use crate::xml::XmlElement;

/// A reference from the `<guide>` element
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GuideReference {
    /// Reference type (e.g. "cover", "toc", "text")
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub guide_type: String,
    /// Path relative to the package document
    pub href: String,
    /// Display title
    pub title: Option<String>,
}

/// Extract `<guide>` references; an absent guide yields an empty list.
pub fn parse_guide(package: &XmlElement) -> Result<Vec<GuideReference>, EpubError> {
    let Some(guide) = package.find(OPF_NS, "guide") else {
        log::info!("No <guide> section in OPF file");
        return Ok(Vec::new());
    };

    let mut references = Vec::new();
    for reference in guide.find_all(OPF_NS, "reference") {
        let (Some(guide_type), Some(href)) = (
            reference.non_empty_attr("type"),
            reference.non_empty_attr("href"),
        ) else {
            return Err(EpubError::Structural(
                "each <reference> must have 'type' and 'href' attributes".to_string(),
            ));
        };
        references.push(GuideReference {
            guide_type: guide_type.to_string(),
            href: href.to_string(),
            title: reference.attr("title").map(str::to_string),
        });
    }

    log::info!("Guide references: {}", references.len());
    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn parse(body: &str) -> Result<Vec<GuideReference>, EpubError> {
        let opf = alloc::format!(
            r#"<package xmlns="http://www.idpf.org/2007/opf">{}</package>"#,
            body
        );
        parse_guide(&parse_document(&opf).unwrap())
    }

    #[test]
    fn test_guide_references() {
        let refs = parse(
            r#"<guide>
  <reference type="cover" title="Cover" href="cover.xhtml"/>
  <reference type="toc" href="toc.xhtml"/>
</guide>"#,
        )
        .unwrap();
        assert_eq!(
            refs,
            vec![
                GuideReference {
                    guide_type: "cover".into(),
                    href: "cover.xhtml".into(),
                    title: Some("Cover".into()),
                },
                GuideReference {
                    guide_type: "toc".into(),
                    href: "toc.xhtml".into(),
                    title: None,
                },
            ]
        );
    }

    #[test]
    fn test_absent_guide_is_empty() {
        assert_eq!(parse("<manifest/>").unwrap(), Vec::new());
    }

    #[test]
    fn test_reference_requires_type_and_href() {
        assert!(matches!(
            parse(r#"<guide><reference href="a.xhtml"/></guide>"#),
            Err(EpubError::Structural(_))
        ));
        assert!(matches!(
            parse(r#"<guide><reference type="text"/></guide>"#),
            Err(EpubError::Structural(_))
        ));
    }

    #[test]
    fn test_references_in_other_namespaces_are_ignored() {
        let refs = parse(r#"<guide><x:reference xmlns:x="urn:x" type="a" href="b"/></guide>"#).unwrap();
        assert!(refs.is_empty());
    }
}
