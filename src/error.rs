//! Unified error types for epub-inspect
//!
//! `EpubError` carries one variant per failure kind the inspection pipeline
//! can report, each with a human-readable cause. `StageError` pairs an error
//! with the pipeline stage that produced it.

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Top-level error type for epub-inspect operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EpubError {
    /// A mandatory element/attribute is missing, misplaced, or violates a fixed structural rule
    Structural(String),
    /// Bytes that must decode as ASCII or UTF-8 do not
    Encoding(String),
    /// The underlying XML is not well-formed
    MalformedDocument(String),
    /// A declared cross-reference does not resolve
    ReferenceNotFound(String),
    /// A value required to be unique within its scope repeats
    DuplicateKey(String),
    /// A required archive entry is absent
    MissingResource(String),
    /// ZIP archive error
    Zip(ZipError),
    /// I/O error (description only, since `std::io::Error` is not `Clone`)
    Io(String),
}

/// Failure classification, independent of the cause text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    /// See [`EpubError::Structural`].
    Structural,
    /// See [`EpubError::Encoding`].
    Encoding,
    /// See [`EpubError::MalformedDocument`].
    MalformedDocument,
    /// See [`EpubError::ReferenceNotFound`].
    ReferenceNotFound,
    /// See [`EpubError::DuplicateKey`].
    DuplicateKey,
    /// See [`EpubError::MissingResource`].
    MissingResource,
    /// The archive itself could not be read (ZIP or I/O failure).
    Archive,
}

impl ErrorKind {
    /// Stable name used in CLI output and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Structural => "StructuralError",
            ErrorKind::Encoding => "EncodingError",
            ErrorKind::MalformedDocument => "MalformedDocumentError",
            ErrorKind::ReferenceNotFound => "ReferenceNotFoundError",
            ErrorKind::DuplicateKey => "DuplicateKeyError",
            ErrorKind::MissingResource => "MissingResourceError",
            ErrorKind::Archive => "ArchiveError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EpubError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EpubError::Structural(_) => ErrorKind::Structural,
            EpubError::Encoding(_) => ErrorKind::Encoding,
            EpubError::MalformedDocument(_) => ErrorKind::MalformedDocument,
            EpubError::ReferenceNotFound(_) => ErrorKind::ReferenceNotFound,
            EpubError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            EpubError::MissingResource(_) => ErrorKind::MissingResource,
            EpubError::Zip(_) | EpubError::Io(_) => ErrorKind::Archive,
        }
    }
}

impl fmt::Display for EpubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpubError::Structural(msg) => write!(f, "Structural error: {}", msg),
            EpubError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            EpubError::MalformedDocument(msg) => write!(f, "Malformed document: {}", msg),
            EpubError::ReferenceNotFound(msg) => write!(f, "Reference not found: {}", msg),
            EpubError::DuplicateKey(msg) => write!(f, "Duplicate key: {}", msg),
            EpubError::MissingResource(msg) => write!(f, "Missing resource: {}", msg),
            EpubError::Zip(kind) => write!(f, "ZIP error: {}", kind),
            EpubError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Stage {
    /// Opening the archive and verifying the `mimetype` entry.
    Archive,
    /// Locating the package document through `META-INF/container.xml`.
    Container,
    /// Package root, `version` and `unique-identifier`.
    Identity,
    /// `<metadata>` extraction and unique-identifier cross-check.
    Metadata,
    /// `<manifest>` extraction and id lookup.
    Manifest,
    /// `<spine>` extraction and reference checks.
    Spine,
    /// `<guide>` extraction.
    Guide,
}

impl Stage {
    /// Lowercase stage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Archive => "archive",
            Stage::Container => "container",
            Stage::Identity => "identity",
            Stage::Metadata => "metadata",
            Stage::Manifest => "manifest",
            Stage::Spine => "spine",
            Stage::Guide => "guide",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An [`EpubError`] tagged with the stage that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    /// Stage where the run stopped.
    pub stage: Stage,
    /// First violation encountered.
    pub error: EpubError,
}

impl StageError {
    /// Tag `error` with `stage`.
    pub fn new(stage: Stage, error: EpubError) -> Self {
        Self { stage, error }
    }

    /// Kind of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.error)
    }
}

/// ZIP-specific error variants
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ZipErrorKind {
    /// File not found in archive
    FileNotFound,
    /// Invalid ZIP format
    InvalidFormat,
    /// Unsupported compression method
    UnsupportedCompression,
    /// Decompression failed
    DecompressError,
    /// CRC32 mismatch
    CrcMismatch,
    /// I/O error during ZIP operations
    IoError,
    /// Central directory holds more entries than the configured limit
    CentralDirFull,
    /// Buffer too small for decompressed content
    BufferTooSmall,
    /// File exceeds maximum allowed size
    FileTooLarge,
    /// Entry is flagged as encrypted
    Encrypted,
    /// ZIP64 structures are present but unsupported
    UnsupportedZip64,
}

/// Public ZIP error type alias used across the crate API.
pub type ZipError = ZipErrorKind;

impl fmt::Display for ZipErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZipErrorKind::FileNotFound => write!(f, "file not found in archive"),
            ZipErrorKind::InvalidFormat => write!(f, "invalid ZIP format"),
            ZipErrorKind::UnsupportedCompression => write!(f, "unsupported compression method"),
            ZipErrorKind::DecompressError => write!(f, "decompression failed"),
            ZipErrorKind::CrcMismatch => write!(f, "CRC32 checksum mismatch"),
            ZipErrorKind::IoError => write!(f, "I/O error"),
            ZipErrorKind::CentralDirFull => write!(f, "central directory full"),
            ZipErrorKind::BufferTooSmall => write!(f, "buffer too small"),
            ZipErrorKind::FileTooLarge => write!(f, "file too large"),
            ZipErrorKind::Encrypted => write!(f, "encrypted entries are not supported"),
            ZipErrorKind::UnsupportedZip64 => write!(f, "ZIP64 is not supported"),
        }
    }
}

impl From<ZipError> for EpubError {
    fn from(err: ZipError) -> Self {
        EpubError::Zip(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EpubError {}

#[cfg(feature = "std")]
impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ZipErrorKind {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epub_error_display() {
        let err = EpubError::MalformedDocument("bad xml".into());
        assert_eq!(format!("{}", err), "Malformed document: bad xml");
    }

    #[test]
    fn test_kind_maps_each_variant() {
        assert_eq!(
            EpubError::Structural(String::new()).kind(),
            ErrorKind::Structural
        );
        assert_eq!(EpubError::Encoding(String::new()).kind(), ErrorKind::Encoding);
        assert_eq!(
            EpubError::ReferenceNotFound(String::new()).kind(),
            ErrorKind::ReferenceNotFound
        );
        assert_eq!(
            EpubError::DuplicateKey(String::new()).kind(),
            ErrorKind::DuplicateKey
        );
        assert_eq!(
            EpubError::MissingResource(String::new()).kind(),
            ErrorKind::MissingResource
        );
        assert_eq!(
            EpubError::Zip(ZipErrorKind::InvalidFormat).kind(),
            ErrorKind::Archive
        );
        assert_eq!(EpubError::Io(String::new()).kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_stage_error_display_names_stage() {
        let err = StageError::new(
            Stage::Metadata,
            EpubError::ReferenceNotFound("unique-identifier 'x'".into()),
        );
        let display = format!("{}", err);
        assert!(display.starts_with("[metadata]"));
        assert!(display.contains("unique-identifier 'x'"));
        assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    }

    #[test]
    fn test_stages_are_ordered_like_the_pipeline() {
        assert!(Stage::Archive < Stage::Container);
        assert!(Stage::Identity < Stage::Metadata);
        assert!(Stage::Manifest < Stage::Spine);
        assert!(Stage::Spine < Stage::Guide);
    }

    #[test]
    fn test_zip_error_converts_into_epub_error() {
        let err: EpubError = ZipErrorKind::CrcMismatch.into();
        assert!(format!("{}", err).contains("ZIP error"));
    }
}
