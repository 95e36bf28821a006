//! Nested codecs applied to archive parts.
//!
//! Variant decoding only depends on the three operations of [`Codecs`]. The
//! default [`StandardCodecs`] implements them in memory; callers with their own
//! WAD or MIME implementation can supply a different [`Codecs`].

pub mod mime;
pub mod wad;
pub mod zip;

use std::fmt;

use crate::error::CodecError;

/// One extracted file: its name and its bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub name: String,
    pub content: Vec<u8>,
}

impl ExtractedEntry {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

impl fmt::Debug for ExtractedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractedEntry")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// The nested decoders an archive variant is assembled from.
///
/// Implementations must be stateless with respect to their inputs so that
/// independent archives can be decoded concurrently.
pub trait Codecs: Send + Sync {
    /// Decompress a ZIP archive, preserving central directory order.
    fn unzip(&self, data: &[u8]) -> Result<Vec<ExtractedEntry>, CodecError>;

    /// Extract the single payload of a WAD blob.
    fn wad_extract(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Split a MIME multipart message into named parts, in order.
    fn mime_decode(&self, data: &[u8]) -> Result<Vec<ExtractedEntry>, CodecError>;
}

/// Built-in in-memory codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCodecs;

impl Codecs for StandardCodecs {
    fn unzip(&self, data: &[u8]) -> Result<Vec<ExtractedEntry>, CodecError> {
        zip::unzip(data).map_err(|e| CodecError::Zip(format!("{e:#}")))
    }

    fn wad_extract(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        wad::wad_extract(data)
    }

    fn mime_decode(&self, data: &[u8]) -> Result<Vec<ExtractedEntry>, CodecError> {
        mime::mime_decode(data)
    }
}
