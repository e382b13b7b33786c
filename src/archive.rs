//! Archive access used by the inspection pipeline.
//!
//! The pipeline only needs four things from an archive: entry names in
//! physical order, per-entry header metadata, decoded entry content, and raw
//! byte ranges of the underlying file. [`crate::zip::StreamingZip`] is the
//! bundled implementation.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::ZipError;

/// Compression method "stored" (no compression).
pub const METHOD_STORED: u16 = 0;

/// Compression method "deflated".
pub const METHOD_DEFLATED: u16 = 8;

/// General-purpose flag bit 0: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// Header metadata for one archive entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntryInfo {
    /// Entry name as stored in the archive
    pub name: String,
    /// Compression method (0 = stored, 8 = deflated)
    pub compression_method: u16,
    /// General-purpose bit flags
    pub flags: u16,
    /// Whether the entry carries extra header fields
    pub has_extra_field: bool,
    /// Compressed size in bytes
    pub compressed_size: u64,
    /// Uncompressed size in bytes
    pub uncompressed_size: u64,
}

impl ArchiveEntryInfo {
    /// `true` when the entry is stored without compression.
    pub fn is_stored(&self) -> bool {
        self.compression_method == METHOD_STORED
    }

    /// `true` when the encrypted flag bit is set.
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

/// Random access to a packaged archive.
pub trait EpubArchive {
    /// Entry names in physical order.
    fn entry_names(&self) -> Vec<&str>;

    /// Header metadata for `name`, or `None` if the archive has no such entry.
    fn entry_info(&self, name: &str) -> Option<ArchiveEntryInfo>;

    /// Decoded content of `name`.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ZipError>;

    /// Raw bytes `[start, end)` of the underlying file.
    ///
    /// Returns fewer bytes when the file ends before `end`.
    fn read_raw_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>, ZipError>;

    /// `true` if the archive has an entry named `name`.
    fn contains(&self, name: &str) -> bool {
        self.entry_info(name).is_some()
    }
}
