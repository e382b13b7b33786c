//! epub-inspect -- structural validator and package extractor for EPUB archives
//!
//! Verifies the OCF `mimetype` entry (logical and physical layout), finds the
//! package document through `META-INF/container.xml`, and parses it into
//! typed identity, metadata, manifest, spine and guide records while
//! enforcing the cross-references between them.
//!
//! # Features
//!
//! - `std` (default) -- streaming ZIP reader, file I/O and end-to-end inspection
//! - `async` -- tokio-based file reading for [`async_api`]
//! - `serde` -- `Serialize` for every record type
//! - `cli` -- the `epub-inspect` binary
//!
//! # Example
//!
//! ```no_run
//! let report = epub_inspect::inspect_epub_file("book.epub")?;
//! println!("OPF {}", report.document.identity.version);
//! for advisory in &report.advisories {
//!     println!("warning: {}", advisory.message);
//! }
//! # Ok::<(), epub_inspect::StageError>(())
//! ```
//!
//! Without `std`, the package layer still works on text already extracted
//! from an archive: see [`package::parse_package`].

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(clippy::large_enum_variant, clippy::large_stack_arrays, clippy::redundant_clone)]
#![warn(
    clippy::box_collection,
    clippy::needless_collect,
    clippy::map_clone,
    clippy::implicit_clone,
    clippy::inefficient_to_string
)]

extern crate alloc;

pub mod advisory;
pub mod archive;
pub mod container;
pub mod error;
pub mod guide;
pub mod manifest;
pub mod media_types;
pub mod metadata;
pub mod mimetype;
pub mod package;
pub mod spine;
pub mod xml;

#[cfg(feature = "std")]
pub mod inspect;

#[cfg(feature = "async")]
pub mod async_api;

#[cfg(feature = "std")]
pub mod zip;

// Re-export key types for convenience
pub use advisory::Advisory;
pub use archive::{ArchiveEntryInfo, EpubArchive};
#[cfg(feature = "async")]
pub use async_api::{inspect_epub_file_async, inspect_epub_file_async_with_options};
pub use container::{locate_package_document, ContainerDocument, RootfileReference};
pub use error::{EpubError, ErrorKind, Stage, StageError, ZipError, ZipErrorKind};
pub use guide::GuideReference;
#[cfg(feature = "std")]
pub use inspect::{
    inspect_archive, inspect_epub_file, inspect_epub_file_with_options, inspect_epub_reader,
    inspect_epub_reader_with_options, EpubInspector, InspectOptions, InspectReport,
};
pub use manifest::{ManifestItem, ManifestLookup};
pub use media_types::MediaTypeTables;
pub use metadata::{Creator, DateEntry, Identifier, MetaEntry, MetadataRecord};
pub use mimetype::verify_mimetype;
pub use package::{parse_package, PackageDocument, PackageIdentity, ParsedPackage};
pub use spine::{Spine, SpineItemRef};
#[cfg(feature = "std")]
pub use zip::{StreamingZip, ZipLimits};
