//! Supported (family, extension) cells and how each one is assembled.
//!
//! | Variant | First part | Second part | Result |
//! |---------|------------|-------------|--------|
//! | JPC | single payload sized by the 0x12 field | none | `unzip(payload)` |
//! | JWS | `unzip` | `wad_extract` then `mime_decode` | first, then second |
//! | JWX | `unzip` | `wad_extract` then `unzip` | first, then second |
//! | JPD (AAA/AER) | `unzip` | `wad_extract` then `unzip` | first, then second |

use std::fmt;

use super::header::{HeaderPart, PartRange};
use crate::codec::{Codecs, ExtractedEntry};
use crate::error::{ArchiveError, CodecError, Result, Stage};
use crate::name::{ArchiveExtension, ArchiveKind};

/// A supported archive variant.
///
/// AER archives are handled exactly like AAA ones and map to the `Aaa*` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    AaaJwx,
    AaaJws,
    AaaJpc,
    AaaJpd,
    NnfJwx,
    NnfJws,
    NnfJpc,
}

/// How the WAD payload of a two-part archive is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nested {
    Zip,
    Mime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// One ZIP payload located by the second-part size field.
    SinglePayload,
    /// ZIP first part, WAD second part wrapping `Nested`.
    TwoPart(Nested),
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::AaaJwx,
        Variant::AaaJws,
        Variant::AaaJpc,
        Variant::AaaJpd,
        Variant::NnfJwx,
        Variant::NnfJws,
        Variant::NnfJpc,
    ];

    /// Map a (kind, extension) pair to its variant.
    ///
    /// AAA/JPB, NNF/JPD and NNF/JPB have never been seen in the wild and are
    /// rejected as unsupported.
    pub fn select(kind: ArchiveKind, extension: ArchiveExtension) -> Result<Self> {
        use ArchiveExtension::*;
        use ArchiveKind::*;

        match (kind, extension) {
            (Aaa | Aer, Jwx) => Ok(Variant::AaaJwx),
            (Aaa | Aer, Jws) => Ok(Variant::AaaJws),
            (Aaa | Aer, Jpc) => Ok(Variant::AaaJpc),
            (Aaa | Aer, Jpd) => Ok(Variant::AaaJpd),
            (Nnf, Jwx) => Ok(Variant::NnfJwx),
            (Nnf, Jws) => Ok(Variant::NnfJws),
            (Nnf, Jpc) => Ok(Variant::NnfJpc),
            (Aaa | Aer, Jpb) | (Nnf, Jpd | Jpb) => {
                Err(ArchiveError::UnsupportedFormat { kind, extension })
            }
        }
    }

    /// Family label; AAA and AER share one.
    pub fn family(&self) -> &'static str {
        match self {
            Variant::AaaJwx | Variant::AaaJws | Variant::AaaJpc | Variant::AaaJpd => "AAA",
            Variant::NnfJwx | Variant::NnfJws | Variant::NnfJpc => "NNF",
        }
    }

    pub fn extension(&self) -> ArchiveExtension {
        match self {
            Variant::AaaJwx | Variant::NnfJwx => ArchiveExtension::Jwx,
            Variant::AaaJws | Variant::NnfJws => ArchiveExtension::Jws,
            Variant::AaaJpc | Variant::NnfJpc => ArchiveExtension::Jpc,
            Variant::AaaJpd => ArchiveExtension::Jpd,
        }
    }

    fn layout(&self) -> Layout {
        match self {
            Variant::AaaJpc | Variant::NnfJpc => Layout::SinglePayload,
            Variant::AaaJws | Variant::NnfJws => Layout::TwoPart(Nested::Mime),
            Variant::AaaJwx | Variant::NnfJwx | Variant::AaaJpd => Layout::TwoPart(Nested::Zip),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family(), self.extension())
    }
}

/// Decoder for one archive, owning its bytes.
///
/// Built once the variant is known; decoding does no I/O.
pub struct Decoder {
    variant: Variant,
    data: Vec<u8>,
}

impl Decoder {
    pub fn new(variant: Variant, data: Vec<u8>) -> Self {
        Self { variant, data }
    }

    /// Select the variant for `(kind, extension)` and take ownership of `data`.
    pub fn create(kind: ArchiveKind, extension: ArchiveExtension, data: Vec<u8>) -> Result<Self> {
        Ok(Self::new(Variant::select(kind, extension)?, data))
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decode the archive into its ordered entries.
    ///
    /// All ranges are validated before any codec runs, so a bad header is
    /// always reported as [`ArchiveError::CorruptHeader`].
    pub fn decode<C: Codecs + ?Sized>(&self, codecs: &C) -> Result<Vec<ExtractedEntry>> {
        let part = HeaderPart::new(&self.data)?;

        match self.variant.layout() {
            Layout::SinglePayload => {
                let payload = part.jpc_payload_range()?;
                self.log_range("payload", payload);
                self.stage(Stage::FirstPart, codecs.unzip(payload.slice(&self.data)))
            }
            Layout::TwoPart(nested) => {
                let first = part.first_part_range()?;
                let second = part.second_part_range()?;
                self.log_range("first part", first);
                self.log_range("second part", second);

                let mut entries =
                    self.stage(Stage::FirstPart, codecs.unzip(first.slice(&self.data)))?;
                let blob = self.stage(
                    Stage::SecondPart,
                    codecs.wad_extract(second.slice(&self.data)),
                )?;
                let inner = match nested {
                    Nested::Zip => codecs.unzip(&blob),
                    Nested::Mime => codecs.mime_decode(&blob),
                };
                entries.extend(self.stage(Stage::NestedDecode, inner)?);
                Ok(entries)
            }
        }
    }

    fn stage<T>(&self, stage: Stage, result: std::result::Result<T, CodecError>) -> Result<T> {
        result.map_err(|source| ArchiveError::ContainerDecode {
            variant: self.variant,
            stage,
            source,
        })
    }

    fn log_range(&self, what: &str, range: PartRange) {
        log::debug!(
            "{}: {what} at {}..{} ({} bytes)",
            self.variant,
            range.start,
            range.end(),
            range.len
        );
    }
}
