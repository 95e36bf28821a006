//! Archive file name validation and format detection.
//!
//! Office-issued archives carry their format in the file name, so everything
//! here is a pure function of the name. No file is opened.
//!
//! ## Naming grammar
//!
//! The base name is exactly 27 ASCII characters:
//!
//! ```text
//! NNF20240115093000_A1631.JWX
//! ^^^                          family marker, 3 uppercase letters
//!    ^^^^^^^^^^^^^^            receipt serial, 14 digits
//!                  ^           '_'
//!                   ^^^^^      document code, 5 uppercase letters or digits
//!                        ^     '.'
//!                         ^^^  extension, case-insensitive
//! ```

use std::fmt;
use std::path::Path;

use crate::error::{ArchiveError, Result};

const NAME_LEN: usize = 27;
const MARKER_LEN: usize = 3;
const SERIAL_LEN: usize = 14;
const DOC_CODE_LEN: usize = 5;

/// Archive family, taken from the marker at the start of the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Aaa,
    Aer,
    Nnf,
}

impl ArchiveKind {
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "AAA" => Some(ArchiveKind::Aaa),
            "AER" => Some(ArchiveKind::Aer),
            "NNF" => Some(ArchiveKind::Nnf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Aaa => "AAA",
            ArchiveKind::Aer => "AER",
            ArchiveKind::Nnf => "NNF",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive file extension.
///
/// `Jpb` is recognized so that it is reported as unsupported rather than
/// unknown; no family has a decoder for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveExtension {
    Jwx,
    Jws,
    Jpc,
    Jpd,
    Jpb,
}

impl ArchiveExtension {
    pub const ALL: [ArchiveExtension; 5] = [
        ArchiveExtension::Jwx,
        ArchiveExtension::Jws,
        ArchiveExtension::Jpc,
        ArchiveExtension::Jpd,
        ArchiveExtension::Jpb,
    ];

    /// Match an extension without the leading dot, ignoring ASCII case.
    pub fn from_str_ignore_case(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(ext))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveExtension::Jwx => "JWX",
            ArchiveExtension::Jws => "JWS",
            ArchiveExtension::Jpc => "JPC",
            ArchiveExtension::Jpd => "JPD",
            ArchiveExtension::Jpb => "JPB",
        }
    }
}

impl fmt::Display for ArchiveExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final path component as UTF-8, if there is one.
fn base_name(filename: &str) -> Option<&str> {
    Path::new(filename).file_name()?.to_str()
}

/// Check a file name against the office naming grammar.
///
/// Only the final path component is considered. Any deviation is invalid.
pub fn validate(filename: &str) -> bool {
    let Some(name) = base_name(filename) else {
        return false;
    };
    let bytes = name.as_bytes();
    if bytes.len() != NAME_LEN {
        return false;
    }

    let (marker, rest) = bytes.split_at(MARKER_LEN);
    let (serial, rest) = rest.split_at(SERIAL_LEN);
    let (sep, rest) = rest.split_at(1);
    let (doc_code, rest) = rest.split_at(DOC_CODE_LEN);
    let (dot, ext) = rest.split_at(1);

    marker.iter().all(u8::is_ascii_uppercase)
        && serial.iter().all(u8::is_ascii_digit)
        && sep == b"_"
        && doc_code
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && dot == b"."
        && std::str::from_utf8(ext)
            .ok()
            .and_then(ArchiveExtension::from_str_ignore_case)
            .is_some()
}

/// Archive family from the marker that opens the base name.
pub fn detect_kind(filename: &str) -> Result<ArchiveKind> {
    base_name(filename)
        .and_then(|name| name.get(..MARKER_LEN))
        .and_then(ArchiveKind::from_marker)
        .ok_or_else(|| ArchiveError::UnknownFormat {
            name: filename.to_string(),
        })
}

/// Archive extension, matched case-insensitively.
pub fn detect_extension(filename: &str) -> Result<ArchiveExtension> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ArchiveExtension::from_str_ignore_case)
        .ok_or_else(|| ArchiveError::UnknownFormat {
            name: filename.to_string(),
        })
}
