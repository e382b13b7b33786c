//! Namespace-aware XML element tree built from quick-xml events
//!
//! Container and package documents are parsed once into an owned, immutable
//! tree. Every later stage borrows it. Names are resolved by quick-xml's
//! `NsReader` while reading, so lookups compare the namespace URI and local
//! name instead of the literal tag text.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::EpubError;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A resolved attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Namespace URI; `None` for unprefixed attributes
    pub namespace: Option<String>,
    /// Local part of the attribute name
    pub local_name: String,
    /// Unescaped attribute value
    pub value: String,
}

/// An element with its resolved name, attributes, children and direct text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlElement {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    /// Namespace URI of this element, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local part of the element name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// `true` when this element is `{namespace}local_name`.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    /// Name in `{namespace}local` notation (just `local` without a namespace).
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// All attributes, in document order.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Value of the unprefixed attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of the attribute `{namespace}name`.
    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    /// Value of the unprefixed attribute `name`, treating an empty value as absent.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    /// Direct child elements, in document order.
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First direct child named `{namespace}local_name`.
    pub fn find(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, local_name))
    }

    /// All direct children named `{namespace}local_name`, in document order.
    pub fn find_all<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children
            .iter()
            .filter(move |c| c.is(namespace, local_name))
    }

    /// Trimmed text directly inside this element (entity references resolved).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Like [`XmlElement::text`], but `None` when there is no text.
    pub fn text_opt(&self) -> Option<&str> {
        if self.text.is_empty() {
            None
        } else {
            Some(&self.text)
        }
    }
}

/// Parse `text` into an element tree rooted at the document element.
///
/// Fails with [`EpubError::MalformedDocument`] when the input is not
/// well-formed or uses an undeclared namespace prefix.
pub fn parse_document(text: &str) -> Result<XmlElement, EpubError> {
    let mut reader = NsReader::from_reader(text.as_bytes());

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let element = open_element(&reader, &e)?;
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = open_element(&reader, &e)?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| malformed("closing tag without matching start tag"))?;
                finish_text(&mut element);
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(e)) => {
                let chunk = e
                    .decode()
                    .map_err(|err| malformed(&format!("Decode error: {:?}", err)))?;
                push_text(&mut stack, &chunk)?;
            }
            Ok(Event::CData(e)) => {
                let chunk = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|err| malformed(&format!("Decode error: {:?}", err)))?
                    .to_string();
                push_text(&mut stack, &chunk)?;
            }
            Ok(Event::GeneralRef(e)) => {
                let entity_name = e
                    .decode()
                    .map_err(|err| malformed(&format!("Decode error: {:?}", err)))?;
                let entity = format!("&{};", entity_name);
                let resolved = unescape(&entity)
                    .map_err(|err| malformed(&format!("Unescape error: {:?}", err)))?
                    .to_string();
                push_text(&mut stack, &resolved)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(malformed(&format!(
                    "XML parse error at byte {}: {:?}",
                    reader.buffer_position(),
                    err
                )))
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(malformed(&format!("unclosed element <{}>", open.local_name)));
    }
    root.ok_or_else(|| malformed("document has no root element"))
}

fn malformed(msg: &str) -> EpubError {
    EpubError::MalformedDocument(msg.to_string())
}

fn decode(reader: &NsReader<&[u8]>, bytes: &[u8]) -> Result<String, EpubError> {
    reader
        .decoder()
        .decode(bytes)
        .map(|s| s.to_string())
        .map_err(|err| malformed(&format!("Decode error: {:?}", err)))
}

/// Namespace URI for a resolved name; unknown prefixes are malformed.
fn namespace_uri(
    reader: &NsReader<&[u8]>,
    resolved: ResolveResult<'_>,
    name: &str,
) -> Result<Option<String>, EpubError> {
    match resolved {
        ResolveResult::Bound(ns) => decode(reader, ns.into_inner()).map(Some),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(_) => Err(malformed(&format!("unbound prefix in '{}'", name))),
    }
}

fn open_element(reader: &NsReader<&[u8]>, e: &BytesStart<'_>) -> Result<XmlElement, EpubError> {
    let tag = decode(reader, e.name().as_ref())?;
    let (resolved, local) = reader.resolve_element(e.name());
    let namespace = namespace_uri(reader, resolved, &tag)?;
    let local_name = decode(reader, local.as_ref())?;

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(&format!("Attr error in <{}>: {:?}", tag, err)))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = decode(reader, attr.key.as_ref())?;
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let namespace = namespace_uri(reader, resolved, &key)?;
        let raw_value = decode(reader, &attr.value)?;
        let value = unescape(&normalize_attribute_whitespace(&raw_value))
            .map_err(|err| malformed(&format!("Unescape error: {:?}", err)))?
            .to_string();
        attributes.push(XmlAttribute {
            namespace,
            local_name: decode(reader, local.as_ref())?,
            value,
        });
    }

    Ok(XmlElement {
        namespace,
        local_name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Literal tab, CR and LF in an attribute value read as a single space.
/// Character references are expanded afterwards and keep their value.
fn normalize_attribute_whitespace(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\t', '\n', '\r'], " ")
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), EpubError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(malformed("document has more than one root element"))
    } else {
        *root = Some(element);
        Ok(())
    }
}

/// Only text ahead of the first child element belongs to the element.
fn push_text(stack: &mut [XmlElement], chunk: &str) -> Result<(), EpubError> {
    match stack.last_mut() {
        Some(open) if open.children.is_empty() => {
            open.text.push_str(chunk);
            Ok(())
        }
        Some(_) => Ok(()),
        None if chunk.trim().is_empty() => Ok(()),
        None => Err(malformed("text content outside the root element")),
    }
}

fn finish_text(element: &mut XmlElement) {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_string();
    }
}
