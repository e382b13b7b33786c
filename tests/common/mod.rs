//! Shared helpers: an in-memory ZIP writer and a minimal EPUB fixture.

#![allow(dead_code)]

use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub const MIMETYPE: &[u8] = b"application/epub+zip";

pub const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

pub const CONTENT_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="BookId">urn:isbn:9780000000001</dc:identifier>
  </metadata>
  <manifest>
    <item id="chap1" href="chap1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="chap1"/>
  </spine>
</package>"#;

/// One archive entry, written exactly as configured.
pub struct Entry {
    pub name: String,
    pub data: Vec<u8>,
    pub uncompressed: Vec<u8>,
    pub method: u16,
    pub flags: u16,
    pub local_extra: Vec<u8>,
    pub central_extra: Vec<u8>,
}

impl Entry {
    pub fn stored(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            data: content.to_vec(),
            uncompressed: content.to_vec(),
            method: 0,
            flags: 0,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
        }
    }

    pub fn deflated(name: &str, content: &[u8]) -> Self {
        Self {
            data: miniz_oxide::deflate::compress_to_vec(content, 6),
            method: 8,
            ..Self::stored(name, content)
        }
    }
}

pub fn build_zip(entries: &[Entry]) -> Vec<u8> {
    let mut zip = Vec::new();
    let mut offsets = Vec::new();

    for entry in entries {
        offsets.push(zip.len() as u32);
        let crc = crc32fast::hash(&entry.uncompressed);
        zip.extend_from_slice(&0x04034b50u32.to_le_bytes());
        zip.extend_from_slice(&20u16.to_le_bytes());
        zip.extend_from_slice(&entry.flags.to_le_bytes());
        zip.extend_from_slice(&entry.method.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&crc.to_le_bytes());
        zip.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(entry.uncompressed.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        zip.extend_from_slice(&(entry.local_extra.len() as u16).to_le_bytes());
        zip.extend_from_slice(entry.name.as_bytes());
        zip.extend_from_slice(&entry.local_extra);
        zip.extend_from_slice(&entry.data);
    }

    let cd_offset = zip.len() as u32;
    for (entry, offset) in entries.iter().zip(&offsets) {
        let crc = crc32fast::hash(&entry.uncompressed);
        zip.extend_from_slice(&0x02014b50u32.to_le_bytes());
        zip.extend_from_slice(&20u16.to_le_bytes());
        zip.extend_from_slice(&20u16.to_le_bytes());
        zip.extend_from_slice(&entry.flags.to_le_bytes());
        zip.extend_from_slice(&entry.method.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&crc.to_le_bytes());
        zip.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(entry.uncompressed.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        zip.extend_from_slice(&(entry.central_extra.len() as u16).to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&0u32.to_le_bytes());
        zip.extend_from_slice(&offset.to_le_bytes());
        zip.extend_from_slice(entry.name.as_bytes());
        zip.extend_from_slice(&entry.central_extra);
    }

    let cd_size = zip.len() as u32 - cd_offset;
    zip.extend_from_slice(&0x06054b50u32.to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes());
    zip.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    zip.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    zip.extend_from_slice(&cd_size.to_le_bytes());
    zip.extend_from_slice(&cd_offset.to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes());
    zip
}

/// Entries of a valid EPUB whose package document is `opf`.
pub fn epub_entries(opf: &str) -> Vec<Entry> {
    vec![
        Entry::stored("mimetype", MIMETYPE),
        Entry::deflated("META-INF/container.xml", CONTAINER_XML),
        Entry::deflated("OEBPS/content.opf", opf.as_bytes()),
        Entry::deflated(
            "OEBPS/chap1.xhtml",
            br#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>Hello</p></body></html>"#,
        ),
    ]
}

pub fn epub_with_opf(opf: &str) -> Vec<u8> {
    build_zip(&epub_entries(opf))
}
