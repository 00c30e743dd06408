// src/services/archive.rs

//! Archive download and text extraction.
//!
//! Works are published as small zip packages holding one Shift_JIS text file
//! next to optional metadata. The encoding is fixed for this archive family
//! and is never sniffed.

use std::io::{Cursor, Read};
use std::sync::Arc;

use encoding_rs::SHIFT_JIS;
use zip::ZipArchive;

use crate::error::{AppError, Result};
use crate::utils::Fetcher;

/// Maximum decompressed bytes read from the text entry (zip-bomb protection).
const MAX_TEXT_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Service that downloads an archive and returns its decoded text.
pub struct ArchiveExtractor {
    fetcher: Arc<dyn Fetcher>,
    text_extension: String,
}

impl ArchiveExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, text_extension: impl Into<String>) -> Self {
        Self {
            fetcher,
            text_extension: text_extension.into(),
        }
    }

    /// Fetch the archive at `archive_url` and extract its text payload.
    pub async fn extract(&self, archive_url: &str) -> Result<String> {
        let bytes = self.fetcher.get_bytes(archive_url).await?;
        log::debug!("Downloaded {} bytes from {}", bytes.len(), archive_url);
        extract_text(&bytes, &self.text_extension)
    }
}

/// Open zip bytes, pick the first entry named `*<text_extension>` and decode it.
pub fn extract_text(bytes: &[u8], text_extension: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    // Only the chosen entry is opened; other entries may use methods we cannot read.
    let index = (0..archive.len()).find(|&i| {
        archive
            .name_for_index(i)
            .is_some_and(|name| !name.ends_with('/') && has_extension(name, text_extension))
    });
    let Some(index) = index else {
        return Err(AppError::not_found(format!(
            "no {text_extension} entry in archive"
        )));
    };

    let entry = archive.by_index(index)?;
    let name = entry.name().to_string();
    let mut raw = Vec::new();
    entry
        .take(MAX_TEXT_ENTRY_BYTES)
        .read_to_end(&mut raw)
        .map_err(|e| AppError::format(format!("reading {name}: {e}")))?;
    if raw.len() as u64 >= MAX_TEXT_ENTRY_BYTES {
        return Err(AppError::format(format!(
            "{name} exceeds size limit ({MAX_TEXT_ENTRY_BYTES} bytes)"
        )));
    }

    decode_shift_jis(&raw).ok_or_else(|| AppError::format(format!("{name} is not valid Shift_JIS")))
}

/// Case-sensitive extension match on the final path component.
fn has_extension(name: &str, extension: &str) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name.ends_with(extension)
}

/// Decode Shift_JIS bytes; `None` if any sequence is malformed.
pub fn decode_shift_jis(bytes: &[u8]) -> Option<String> {
    SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}
