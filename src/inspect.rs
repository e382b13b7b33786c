//! End-to-end inspection of an EPUB archive.
//!
//! Runs the whole pipeline: `mimetype` verification, container lookup, and
//! the package stages. The first failure is returned as a [`StageError`].

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::advisory::Advisory;
use crate::archive::EpubArchive;
use crate::container::locate_package_document;
use crate::error::{EpubError, Stage, StageError};
use crate::media_types::MediaTypeTables;
use crate::mimetype::verify_mimetype;
use crate::package::{parse_package, PackageDocument};
use crate::zip::{StreamingZip, ZipLimits};

/// Configuration for inspection runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InspectOptions {
    /// Optional ZIP safety limits used while reading archive entries.
    ///
    /// When `None`, no explicit file-size caps are enforced by this crate.
    pub zip_limits: Option<ZipLimits>,
    /// Media types the manifest and spine stages check against.
    pub media_types: MediaTypeTables,
}

/// Builder for inspection runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpubInspector {
    options: InspectOptions,
}

impl EpubInspector {
    /// Create a new builder with default tables and no explicit limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set explicit ZIP limits.
    pub fn with_zip_limits(mut self, limits: ZipLimits) -> Self {
        self.options.zip_limits = Some(limits);
        self
    }

    /// Replace the media-type tables.
    pub fn with_media_types(mut self, tables: MediaTypeTables) -> Self {
        self.options.media_types = tables;
        self
    }

    /// Inspect an EPUB from a file path.
    pub fn inspect_file<P: AsRef<Path>>(&self, path: P) -> Result<InspectReport, StageError> {
        inspect_epub_file_with_options(path, &self.options)
    }

    /// Inspect an EPUB from an arbitrary reader.
    pub fn inspect_reader<R: Read + Seek>(&self, reader: R) -> Result<InspectReport, StageError> {
        inspect_epub_reader_with_options(reader, &self.options)
    }
}

/// Result of a successful inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InspectReport {
    /// Archive path of the package document, from `container.xml`
    pub package_path: String,
    /// The parsed package document
    pub document: PackageDocument,
    /// Advisories in the order they were raised
    pub advisories: Vec<Advisory>,
}

impl InspectReport {
    /// `true` when the run raised no advisories.
    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }
}

/// Inspect an EPUB from a file path.
pub fn inspect_epub_file<P: AsRef<Path>>(path: P) -> Result<InspectReport, StageError> {
    inspect_epub_file_with_options(path, &InspectOptions::default())
}

/// Inspect an EPUB from a file path with explicit options.
pub fn inspect_epub_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &InspectOptions,
) -> Result<InspectReport, StageError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        StageError::new(
            Stage::Archive,
            EpubError::Io(format!("{}: {}", path.display(), e)),
        )
    })?;
    inspect_epub_reader_with_options(file, options)
}

/// Inspect an EPUB from any `Read + Seek` source.
pub fn inspect_epub_reader<R: Read + Seek>(reader: R) -> Result<InspectReport, StageError> {
    inspect_epub_reader_with_options(reader, &InspectOptions::default())
}

/// Inspect an EPUB from any `Read + Seek` source with explicit options.
pub fn inspect_epub_reader_with_options<R: Read + Seek>(
    reader: R,
    options: &InspectOptions,
) -> Result<InspectReport, StageError> {
    let mut zip = StreamingZip::new_with_limits(reader, options.zip_limits)
        .map_err(|e| StageError::new(Stage::Archive, EpubError::Zip(e)))?;
    inspect_archive(&mut zip, &options.media_types)
}

/// Inspect an already opened archive.
pub fn inspect_archive<A: EpubArchive + ?Sized>(
    archive: &mut A,
    tables: &MediaTypeTables,
) -> Result<InspectReport, StageError> {
    verify_mimetype(archive).map_err(|e| StageError::new(Stage::Archive, e))?;

    let package_path =
        locate_package_document(archive).map_err(|e| StageError::new(Stage::Container, e))?;
    let text =
        read_package_text(archive, &package_path).map_err(|e| StageError::new(Stage::Container, e))?;

    let parsed = parse_package(&text, tables)?;
    log::info!(
        "Inspected '{}' with {} advisories",
        package_path,
        parsed.advisories.len()
    );

    Ok(InspectReport {
        package_path,
        document: parsed.document,
        advisories: parsed.advisories,
    })
}

fn read_package_text<A: EpubArchive + ?Sized>(
    archive: &mut A,
    path: &str,
) -> Result<String, EpubError> {
    if !archive.contains(path) {
        return Err(EpubError::MissingResource(format!(
            "missing package document '{}'",
            path
        )));
    }
    let bytes = archive.read_entry(path)?;
    String::from_utf8(bytes).map_err(|e| {
        EpubError::Encoding(format!(
            "failed to decode package document '{}' as UTF-8: {}",
            path,
            e.utf8_error()
        ))
    })
}
