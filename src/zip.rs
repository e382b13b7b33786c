//! Streaming ZIP reader for EPUB files
//!
//! Reads the central directory once, then seeks to individual entries on
//! demand. Supports stored and DEFLATE entries (miniz_oxide) with CRC32
//! verification, and raw byte-range reads of the underlying file.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use miniz_oxide::{DataFormat, MZFlush, MZStatus};
use std::io::{Read, Seek, SeekFrom};

use crate::archive::{ArchiveEntryInfo, EpubArchive, FLAG_ENCRYPTED, METHOD_DEFLATED, METHOD_STORED};

/// Maximum filename length in ZIP entries
const MAX_FILENAME_LEN: usize = 1024;

/// Read cap applied by [`StreamingZip::read_file_to_vec`] when no limits are set.
pub const DEFAULT_MAX_FILE_READ_SIZE: usize = 64 * 1024 * 1024;

/// Runtime-configurable ZIP safety limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZipLimits {
    /// Maximum compressed or uncompressed file size allowed for reads.
    pub max_file_read_size: usize,
    /// Maximum number of central directory entries loaded.
    pub max_entries: usize,
    /// Whether ZIP parsing should fail on strict structural issues.
    pub strict: bool,
    /// Maximum bytes scanned from file tail while searching for EOCD.
    pub max_eocd_scan: usize,
}

impl ZipLimits {
    /// Create explicit ZIP limits.
    pub fn new(max_file_read_size: usize, max_entries: usize) -> Self {
        Self {
            max_file_read_size,
            max_entries,
            strict: false,
            max_eocd_scan: MAX_EOCD_SCAN,
        }
    }

    /// Enable or disable strict ZIP parsing behavior.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set a cap for EOCD tail scan bytes.
    pub fn with_max_eocd_scan(mut self, max_eocd_scan: usize) -> Self {
        self.max_eocd_scan = max_eocd_scan.max(EOCD_MIN_SIZE);
        self
    }
}

/// Local file header signature (little-endian)
const SIG_LOCAL_FILE_HEADER: u32 = 0x04034b50;

/// Central directory entry signature (little-endian)
const SIG_CD_ENTRY: u32 = 0x02014b50;

/// End of central directory signature (little-endian)
const SIG_EOCD: u32 = 0x06054b50;
/// ZIP64 end of central directory locator signature (little-endian)
const SIG_ZIP64_EOCD_LOCATOR: u32 = 0x07064b50;
/// Minimum EOCD record size in bytes
const EOCD_MIN_SIZE: usize = 22;
/// Maximum EOCD search window (EOCD + max comment length)
const MAX_EOCD_SCAN: usize = EOCD_MIN_SIZE + u16::MAX as usize;

// Re-export the crate's public ZIP error alias for module consumers.
pub use crate::error::ZipError;

#[derive(Clone, Copy, Debug)]
struct EocdInfo {
    cd_offset: u64,
    cd_size: u32,
    num_entries: u16,
    uses_zip64: bool,
}

/// Central directory entry metadata
#[derive(Debug, Clone)]
pub struct CdEntry {
    /// Compression method (0=stored, 8=deflated)
    pub method: u16,
    /// General-purpose bit flags
    pub flags: u16,
    /// Length of the central directory extra field
    pub extra_len: u16,
    /// Compressed size in bytes
    pub compressed_size: u32,
    /// Uncompressed size in bytes
    pub uncompressed_size: u32,
    /// Offset to local file header
    pub local_header_offset: u32,
    /// CRC32 checksum
    pub crc32: u32,
    /// Filename
    pub filename: String,
}

impl CdEntry {
    /// Create new empty entry
    fn new() -> Self {
        Self {
            method: 0,
            flags: 0,
            extra_len: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            local_header_offset: 0,
            crc32: 0,
            filename: String::new(),
        }
    }

    fn info(&self) -> ArchiveEntryInfo {
        ArchiveEntryInfo {
            name: self.filename.clone(),
            compression_method: self.method,
            flags: self.flags,
            has_extra_field: self.extra_len > 0,
            compressed_size: self.compressed_size as u64,
            uncompressed_size: self.uncompressed_size as u64,
        }
    }
}

/// Streaming ZIP file reader
pub struct StreamingZip<F: Read + Seek> {
    /// File handle
    file: F,
    /// Central directory entries, in central directory order
    entries: Vec<CdEntry>,
    /// Optional configurable resource/safety limits.
    limits: Option<ZipLimits>,
}

impl<F: Read + Seek> StreamingZip<F> {
    /// Open a ZIP file and parse the central directory
    pub fn new(file: F) -> Result<Self, ZipError> {
        Self::new_with_limits(file, None)
    }

    /// Open a ZIP file with explicit runtime limits.
    pub fn new_with_limits(mut file: F, limits: Option<ZipLimits>) -> Result<Self, ZipError> {
        let max_eocd_scan = limits
            .map(|l| l.max_eocd_scan.min(MAX_EOCD_SCAN))
            .unwrap_or(MAX_EOCD_SCAN);
        let eocd = Self::find_eocd(&mut file, max_eocd_scan)?;
        if eocd.uses_zip64 {
            return Err(ZipError::UnsupportedZip64);
        }
        let strict = limits.is_some_and(|l| l.strict);
        let max_entries = limits.map_or(usize::MAX, |l| l.max_entries);
        if eocd.num_entries as usize > max_entries {
            if strict {
                return Err(ZipError::CentralDirFull);
            }
            log::warn!(
                "[ZIP] Archive has {} entries but only {} will be loaded",
                eocd.num_entries,
                max_entries
            );
        }

        let mut entries = Vec::with_capacity((eocd.num_entries as usize).min(max_entries));

        file.seek(SeekFrom::Start(eocd.cd_offset))
            .map_err(|_| ZipError::IoError)?;
        let cd_end = eocd.cd_offset + eocd.cd_size as u64;

        for _ in 0..(eocd.num_entries as usize).min(max_entries) {
            let pos = file.stream_position().map_err(|_| ZipError::IoError)?;
            if pos >= cd_end {
                if strict {
                    return Err(ZipError::InvalidFormat);
                }
                break;
            }
            if let Some(entry) = Self::read_cd_entry(&mut file)? {
                entries.push(entry);
            } else if strict {
                return Err(ZipError::InvalidFormat);
            } else {
                break;
            }
        }

        log::debug!(
            "[ZIP] Parsed {} central directory entries (offset {})",
            entries.len(),
            eocd.cd_offset
        );

        Ok(Self {
            file,
            entries,
            limits,
        })
    }

    /// Find EOCD and extract central directory info
    fn find_eocd(file: &mut F, max_eocd_scan: usize) -> Result<EocdInfo, ZipError> {
        let file_size = file.seek(SeekFrom::End(0)).map_err(|_| ZipError::IoError)?;

        if file_size < EOCD_MIN_SIZE as u64 {
            return Err(ZipError::InvalidFormat);
        }

        // Scan last (EOCD + max comment) bytes for EOCD signature.
        let scan_range = file_size.min(max_eocd_scan as u64) as usize;
        let mut buffer = alloc::vec![0u8; scan_range];

        file.seek(SeekFrom::Start(file_size - scan_range as u64))
            .map_err(|_| ZipError::IoError)?;
        file.read_exact(&mut buffer)
            .map_err(|_| ZipError::IoError)?;
        let scan_base = file_size - scan_range as u64;

        for i in (0..=scan_range.saturating_sub(EOCD_MIN_SIZE)).rev() {
            if read_u32_le(&buffer, i) == SIG_EOCD {
                let num_entries = read_u16_le(&buffer, i + 10);
                let cd_size = read_u32_le(&buffer, i + 12);
                let cd_offset = read_u32_le(&buffer, i + 16) as u64;
                let comment_len = read_u16_le(&buffer, i + 20) as u64;
                let eocd_pos = scan_base + i as u64;
                let eocd_end = eocd_pos + EOCD_MIN_SIZE as u64 + comment_len;
                if eocd_end != file_size {
                    continue;
                }

                let cd_end = cd_offset
                    .checked_add(cd_size as u64)
                    .ok_or(ZipError::InvalidFormat)?;
                if cd_end > eocd_pos || cd_end > file_size {
                    return Err(ZipError::InvalidFormat);
                }

                let uses_zip64_sentinel =
                    num_entries == u16::MAX || cd_size == u32::MAX || cd_offset == u32::MAX as u64;
                let uses_zip64_locator = if eocd_pos >= 20 {
                    file.seek(SeekFrom::Start(eocd_pos - 20))
                        .map_err(|_| ZipError::IoError)?;
                    let mut locator_sig = [0u8; 4];
                    file.read_exact(&mut locator_sig)
                        .map_err(|_| ZipError::IoError)?;
                    u32::from_le_bytes(locator_sig) == SIG_ZIP64_EOCD_LOCATOR
                } else {
                    false
                };

                return Ok(EocdInfo {
                    cd_offset,
                    cd_size,
                    num_entries,
                    uses_zip64: uses_zip64_sentinel || uses_zip64_locator,
                });
            }
        }

        Err(ZipError::InvalidFormat)
    }

    /// Read a central directory entry from file
    fn read_cd_entry(file: &mut F) -> Result<Option<CdEntry>, ZipError> {
        let mut sig_buf = [0u8; 4];
        if file.read_exact(&mut sig_buf).is_err() {
            return Ok(None);
        }
        if u32::from_le_bytes(sig_buf) != SIG_CD_ENTRY {
            return Ok(None);
        }

        // Fixed portion after the signature: buf[N] is CD offset N + 4
        let mut buf = [0u8; 42];
        file.read_exact(&mut buf).map_err(|_| ZipError::IoError)?;

        let mut entry = CdEntry::new();
        entry.flags = read_u16_le(&buf, 4); // CD offset 8
        entry.method = read_u16_le(&buf, 6); // CD offset 10
        entry.crc32 = read_u32_le(&buf, 12); // CD offset 16
        entry.compressed_size = read_u32_le(&buf, 16); // CD offset 20
        entry.uncompressed_size = read_u32_le(&buf, 20); // CD offset 24
        let name_len = read_u16_le(&buf, 24) as usize; // CD offset 28
        entry.extra_len = read_u16_le(&buf, 26); // CD offset 30
        let comment_len = read_u16_le(&buf, 28) as usize; // CD offset 32
        entry.local_header_offset = read_u32_le(&buf, 38); // CD offset 42

        if name_len > MAX_FILENAME_LEN {
            return Err(ZipError::InvalidFormat);
        }
        let mut name_buf = alloc::vec![0u8; name_len];
        file.read_exact(&mut name_buf)
            .map_err(|_| ZipError::IoError)?;
        entry.filename = String::from_utf8_lossy(&name_buf).to_string();

        let skip_bytes = entry.extra_len as usize + comment_len;
        if skip_bytes > 0 {
            file.seek(SeekFrom::Current(skip_bytes as i64))
                .map_err(|_| ZipError::IoError)?;
        }

        Ok(Some(entry))
    }

    /// Get entry by exact filename
    pub fn get_entry(&self, name: &str) -> Option<&CdEntry> {
        self.entries.iter().find(|e| e.filename == name)
    }

    /// Read and decompress a file into the provided buffer
    /// Returns number of bytes written to buffer
    pub fn read_file(&mut self, entry: &CdEntry, buf: &mut [u8]) -> Result<usize, ZipError> {
        if entry.flags & FLAG_ENCRYPTED != 0 {
            return Err(ZipError::Encrypted);
        }
        if let Some(limits) = self.limits {
            if entry.uncompressed_size as usize > limits.max_file_read_size {
                return Err(ZipError::FileTooLarge);
            }
            if entry.compressed_size as usize > limits.max_file_read_size {
                return Err(ZipError::FileTooLarge);
            }
        }
        if entry.uncompressed_size as usize > buf.len() {
            return Err(ZipError::BufferTooSmall);
        }

        let data_offset = self.calc_data_offset(entry)?;
        self.file
            .seek(SeekFrom::Start(data_offset))
            .map_err(|_| ZipError::IoError)?;

        match entry.method {
            METHOD_STORED => {
                let size = entry.compressed_size as usize;
                if size > buf.len() {
                    return Err(ZipError::BufferTooSmall);
                }
                self.file
                    .read_exact(&mut buf[..size])
                    .map_err(|_| ZipError::IoError)?;
                if entry.crc32 != 0 && crc32fast::hash(&buf[..size]) != entry.crc32 {
                    return Err(ZipError::CrcMismatch);
                }
                Ok(size)
            }
            METHOD_DEFLATED => {
                let mut input_buf = alloc::vec![0u8; 8 * 1024];
                let mut state = alloc::boxed::Box::new(
                    miniz_oxide::inflate::stream::InflateState::new(DataFormat::Raw),
                );
                let mut compressed_remaining = entry.compressed_size as usize;
                let mut pending = &[][..];
                let mut written = 0usize;

                loop {
                    if pending.is_empty() && compressed_remaining > 0 {
                        let take = core::cmp::min(compressed_remaining, input_buf.len());
                        self.file
                            .read_exact(&mut input_buf[..take])
                            .map_err(|_| ZipError::IoError)?;
                        pending = &input_buf[..take];
                        compressed_remaining -= take;
                    }

                    if written >= buf.len() && (compressed_remaining > 0 || !pending.is_empty()) {
                        return Err(ZipError::BufferTooSmall);
                    }

                    let flush = if compressed_remaining == 0 {
                        MZFlush::Finish
                    } else {
                        MZFlush::None
                    };
                    let result = miniz_oxide::inflate::stream::inflate(
                        &mut state,
                        pending,
                        &mut buf[written..],
                        flush,
                    );
                    let consumed = result.bytes_consumed;
                    let produced = result.bytes_written;
                    pending = &pending[consumed..];
                    written += produced;

                    match result.status {
                        Ok(MZStatus::StreamEnd) => {
                            if compressed_remaining != 0 || !pending.is_empty() {
                                return Err(ZipError::DecompressError);
                            }
                            break;
                        }
                        Ok(MZStatus::Ok) => {
                            if consumed == 0 && produced == 0 {
                                return Err(ZipError::DecompressError);
                            }
                        }
                        Ok(MZStatus::NeedDict) => return Err(ZipError::DecompressError),
                        Err(_) => return Err(ZipError::DecompressError),
                    }
                }

                if entry.crc32 != 0 && crc32fast::hash(&buf[..written]) != entry.crc32 {
                    return Err(ZipError::CrcMismatch);
                }
                Ok(written)
            }
            _ => Err(ZipError::UnsupportedCompression),
        }
    }

    /// Read a whole entry into a freshly allocated buffer.
    ///
    /// The declared sizes come from the central directory and are checked
    /// against the read cap before anything is allocated.
    pub fn read_file_to_vec(&mut self, entry: &CdEntry) -> Result<Vec<u8>, ZipError> {
        let cap = self
            .limits
            .map_or(DEFAULT_MAX_FILE_READ_SIZE, |l| l.max_file_read_size);
        if entry.uncompressed_size as usize > cap || entry.compressed_size as usize > cap {
            return Err(ZipError::FileTooLarge);
        }
        let mut buf = alloc::vec![0u8; entry.uncompressed_size as usize];
        let n = self.read_file(entry, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Read raw bytes `[start, end)` of the underlying file, bypassing entry decoding.
    pub fn read_raw(&mut self, start: u64, end: u64) -> Result<Vec<u8>, ZipError> {
        if end < start {
            return Err(ZipError::InvalidFormat);
        }
        let file_len = self
            .file
            .seek(SeekFrom::End(0))
            .map_err(|_| ZipError::IoError)?;
        self.file
            .seek(SeekFrom::Start(start))
            .map_err(|_| ZipError::IoError)?;
        let available = end.min(file_len).saturating_sub(start);
        let mut out = Vec::with_capacity(available as usize);
        (&mut self.file)
            .take(end - start)
            .read_to_end(&mut out)
            .map_err(|_| ZipError::IoError)?;
        Ok(out)
    }

    /// Calculate the offset to the actual file data (past local header)
    fn calc_data_offset(&mut self, entry: &CdEntry) -> Result<u64, ZipError> {
        let offset = entry.local_header_offset as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|_| ZipError::IoError)?;

        // Local file header: 30 bytes fixed + variable filename/extra
        let mut header = [0u8; 30];
        self.file
            .read_exact(&mut header)
            .map_err(|_| ZipError::IoError)?;

        if read_u32_le(&header, 0) != SIG_LOCAL_FILE_HEADER {
            return Err(ZipError::InvalidFormat);
        }

        let name_len = read_u16_le(&header, 26) as u64;
        let extra_len = read_u16_le(&header, 28) as u64;

        Ok(offset + 30 + name_len + extra_len)
    }

    /// Get number of loaded central directory entries
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }
}

impl<F: Read + Seek> EpubArchive for StreamingZip<F> {
    fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.filename.as_str()).collect()
    }

    fn entry_info(&self, name: &str) -> Option<ArchiveEntryInfo> {
        self.get_entry(name).map(CdEntry::info)
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ZipError> {
        let entry = self.get_entry(name).ok_or(ZipError::FileNotFound)?.clone();
        self.read_file_to_vec(&entry)
    }

    fn read_raw_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>, ZipError> {
        self.read_raw(start, end)
    }
}

/// Read u16 from buffer at offset (little-endian)
fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Read u32 from buffer at offset (little-endian)
fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
