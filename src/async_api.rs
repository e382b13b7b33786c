//! Optional async helpers for inspecting EPUB files.
//!
//! This module is available with the `async` feature.

extern crate alloc;

use alloc::format;
use core::result::Result;
use std::io::Cursor;
use std::path::Path;

use crate::error::{EpubError, Stage, StageError};
use crate::inspect::{inspect_epub_reader_with_options, InspectOptions, InspectReport};

/// Read an EPUB file asynchronously and inspect it.
///
/// This helper reads the file into memory and runs the synchronous pipeline
/// on the buffered bytes.
pub async fn inspect_epub_file_async<P: AsRef<Path>>(path: P) -> Result<InspectReport, StageError> {
    inspect_epub_file_async_with_options(path, &InspectOptions::default()).await
}

/// Read an EPUB file asynchronously and inspect it with options.
pub async fn inspect_epub_file_async_with_options<P: AsRef<Path>>(
    path: P,
    options: &InspectOptions,
) -> Result<InspectReport, StageError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        StageError::new(
            Stage::Archive,
            EpubError::Io(format!("{}: {}", path.display(), e)),
        )
    })?;
    inspect_epub_reader_with_options(Cursor::new(bytes), options)
}
