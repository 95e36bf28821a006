//! Error types for archive decoding.
//!
//! [`ArchiveError`] is what [`extract_archive`](crate::extract_archive) returns.
//! Every variant is terminal for the archive being processed: the input is a
//! static file, so nothing is retried.
//!
//! | Error | Raised by | Bytes read |
//! |-------|-----------|------------|
//! | [`InvalidArchiveName`] | name validation | none |
//! | [`UnknownFormat`] | kind/extension detection | none |
//! | [`UnsupportedFormat`] | variant selection | none |
//! | [`CorruptHeader`] | H16 header arithmetic | whole file |
//! | [`ContainerDecode`] | nested codecs | whole file |
//!
//! [`InvalidArchiveName`]: ArchiveError::InvalidArchiveName
//! [`UnknownFormat`]: ArchiveError::UnknownFormat
//! [`UnsupportedFormat`]: ArchiveError::UnsupportedFormat
//! [`CorruptHeader`]: ArchiveError::CorruptHeader
//! [`ContainerDecode`]: ArchiveError::ContainerDecode

use std::fmt;
use std::io;

use thiserror::Error;

use crate::archive::Variant;
use crate::name::{ArchiveExtension, ArchiveKind};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Stage of a variant's decode at which a nested codec failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the first part (for JPC, the redefined single payload).
    FirstPart,
    /// WAD extraction of the second part.
    SecondPart,
    /// Unzip or MIME decode of the WAD-extracted blob.
    NestedDecode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::FirstPart => "first part",
            Stage::SecondPart => "second part",
            Stage::NestedDecode => "nested decode",
        })
    }
}

/// Failure reported by one of the nested codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("zip: {0}")]
    Zip(String),
    #[error("wad: {0}")]
    Wad(String),
    #[error("mime: {0}")]
    Mime(String),
}

/// Error type for archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The file name does not follow the office naming grammar.
    #[error("archive name {name:?} is invalid")]
    InvalidArchiveName { name: String },

    /// The family marker or extension is not one we know.
    #[error("unknown archive format: {name:?}")]
    UnknownFormat { name: String },

    /// Known kind and extension, but no decoder exists for the pair.
    #[error("unsupported archive format: {kind} {extension}")]
    UnsupportedFormat {
        kind: ArchiveKind,
        extension: ArchiveExtension,
    },

    /// A declared offset or length points outside the archive.
    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    /// A nested codec rejected its input.
    #[error("{variant} decode failed at {stage}")]
    ContainerDecode {
        variant: Variant,
        stage: Stage,
        #[source]
        source: CodecError,
    },

    /// Reading the archive file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ArchiveError {
    pub(crate) fn corrupt_header(msg: impl Into<String>) -> Self {
        ArchiveError::CorruptHeader(msg.into())
    }
}
