//! Archive decoding entry points.
//!
//! Processing an archive runs validate → detect → select → read → decode.
//! Everything up to the variant selection looks only at the file name, so a
//! bad or unsupported name is rejected before the file is opened. The file is
//! then read once, in full, and decoding works on that buffer alone.

mod header;
mod variant;

pub use header::{Header, HeaderPart, PartRange};
pub use variant::{Decoder, Variant};

use std::fs;
use std::path::Path;

use crate::codec::{Codecs, ExtractedEntry, StandardCodecs};
use crate::error::{ArchiveError, Result};
use crate::name;

/// Resolve the variant for an archive file name without touching the file.
pub fn select_variant(filename: &str) -> Result<Variant> {
    if !name::validate(filename) {
        return Err(ArchiveError::InvalidArchiveName {
            name: filename.to_string(),
        });
    }
    let kind = name::detect_kind(filename)?;
    let extension = name::detect_extension(filename)?;
    Variant::select(kind, extension)
}

/// Extract every file from the archive at `path`, using the built-in codecs.
///
/// Entries from the first part come before entries from the second part.
pub fn extract_archive(path: impl AsRef<Path>) -> Result<Vec<ExtractedEntry>> {
    extract_archive_with(path, &StandardCodecs)
}

/// Same as [`extract_archive`] with caller-supplied codecs.
pub fn extract_archive_with<C: Codecs + ?Sized>(
    path: impl AsRef<Path>,
    codecs: &C,
) -> Result<Vec<ExtractedEntry>> {
    let path = path.as_ref();
    let filename = path.to_str().ok_or_else(|| ArchiveError::InvalidArchiveName {
        name: path.to_string_lossy().into_owned(),
    })?;

    let variant = select_variant(filename)?;
    let data = fs::read(path)?;
    decode_with_variant(filename, variant, data, codecs)
}

/// Decode an archive already in memory, named `filename`.
///
/// Applies the same name checks as [`extract_archive`].
pub fn decode_archive<C: Codecs + ?Sized>(
    filename: &str,
    data: Vec<u8>,
    codecs: &C,
) -> Result<Vec<ExtractedEntry>> {
    let variant = select_variant(filename)?;
    decode_with_variant(filename, variant, data, codecs)
}

fn decode_with_variant<C: Codecs + ?Sized>(
    filename: &str,
    variant: Variant,
    data: Vec<u8>,
    codecs: &C,
) -> Result<Vec<ExtractedEntry>> {
    log::debug!("{filename}: {variant}, {} bytes", data.len());
    let entries = Decoder::new(variant, data).decode(codecs)?;
    log::info!("{filename}: extracted {} entries", entries.len());
    Ok(entries)
}
