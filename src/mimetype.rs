//! OCF `mimetype` entry verification.
//!
//! The entry must be readable by byte-offset inspection without a full ZIP
//! parse, so the logical checks (entry order, compression, header fields,
//! encoding) are followed by a cross-check of the physical file layout.

extern crate alloc;

use alloc::format;
use alloc::string::ToString;

use crate::archive::EpubArchive;
use crate::error::EpubError;
use crate::media_types::EPUB_MIMETYPE;

/// Name of the identification entry.
pub const MIMETYPE_ENTRY: &str = "mimetype";

/// ZIP local file header magic.
const ZIP_MAGIC: &[u8] = b"PK";
/// Offset of the first entry's filename in a local file header.
const NAME_OFFSET: u64 = 30;
/// Offset of the first entry's data when it has no extra field.
const CONTENT_OFFSET: u64 = NAME_OFFSET + MIMETYPE_ENTRY.len() as u64;

/// Verify the archive's `mimetype` entry.
///
/// Checks run in order and the first failure is returned:
/// 1. the first entry is named `mimetype`
/// 2. it is stored without compression
/// 3. it has no extra header fields
/// 4. it is not encrypted
/// 5. its content is ASCII ([`EpubError::Encoding`] otherwise)
/// 6. the raw file bytes hold `PK` at 0, `mimetype` at 30 and
///    `application/epub+zip` at 38
///
/// Every other failure is [`EpubError::Structural`].
pub fn verify_mimetype<A: EpubArchive + ?Sized>(archive: &mut A) -> Result<(), EpubError> {
    let first = archive.entry_names().first().map(|name| name.to_string());
    match first.as_deref() {
        Some(MIMETYPE_ENTRY) => {}
        Some(other) => {
            return Err(EpubError::Structural(format!(
                "'mimetype' is not the first entry in the archive (found '{}')",
                other
            )))
        }
        None => {
            return Err(EpubError::Structural(
                "archive is empty; 'mimetype' must be its first entry".to_string(),
            ))
        }
    }

    let info = archive.entry_info(MIMETYPE_ENTRY).ok_or_else(|| {
        EpubError::Structural("'mimetype' entry metadata unavailable".to_string())
    })?;
    if !info.is_stored() {
        return Err(EpubError::Structural(format!(
            "'mimetype' is compressed (method {}); it must be stored",
            info.compression_method
        )));
    }
    if info.has_extra_field {
        return Err(EpubError::Structural(
            "'mimetype' has extra fields in its ZIP header".to_string(),
        ));
    }
    if info.is_encrypted() {
        return Err(EpubError::Structural("'mimetype' is encrypted".to_string()));
    }

    let content = archive.read_entry(MIMETYPE_ENTRY)?;
    if !content.is_ascii() {
        return Err(EpubError::Encoding(
            "'mimetype' content is not ASCII".to_string(),
        ));
    }

    expect_raw(archive, 0, ZIP_MAGIC, "ZIP magic number")?;
    expect_raw(
        archive,
        NAME_OFFSET,
        MIMETYPE_ENTRY.as_bytes(),
        "'mimetype' filename",
    )?;
    expect_raw(
        archive,
        CONTENT_OFFSET,
        EPUB_MIMETYPE.as_bytes(),
        "'mimetype' content",
    )?;

    log::info!("Mimetype entry verified");
    Ok(())
}

fn expect_raw<A: EpubArchive + ?Sized>(
    archive: &mut A,
    start: u64,
    expected: &[u8],
    what: &str,
) -> Result<(), EpubError> {
    let actual = archive.read_raw_range(start, start + expected.len() as u64)?;
    if actual != expected {
        return Err(EpubError::Structural(format!(
            "{} not found at byte offset {}",
            what, start
        )));
    }
    Ok(())
}
