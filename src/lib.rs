//! # efiling-archive
//!
//! Decoder for the submission archives issued by a patent office's e-filing
//! system.
//!
//! Archives come in two families, AAA/AER and NNF, and several extensions.
//! Each extension nests its files differently: a plain ZIP (JPC), or a ZIP
//! followed by a WAD blob wrapping either another ZIP (JWX, JPD) or a MIME
//! multipart message (JWS). This crate validates the file name, selects the
//! variant, slices the archive using its fixed 22-byte header and returns the
//! contained files in order.
//!
//! ## Supported variants
//!
//! | Family | JWX | JWS | JPC | JPD | JPB |
//! |--------|-----|-----|-----|-----|-----|
//! | AAA/AER | yes | yes | yes | yes | no |
//! | NNF | yes | yes | yes | no | no |
//!
//! ## Example
//!
//! ```no_run
//! use efiling_archive::{extract_archive, generate_checksum};
//!
//! fn main() -> Result<(), efiling_archive::ArchiveError> {
//!     let entries = extract_archive("inbox/NNF20240115093000_A1631.JWX")?;
//!     for entry in &entries {
//!         println!("{} {}", generate_checksum(&entry.content), entry.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod checksum;
pub mod cli;
pub mod codec;
pub mod error;
pub mod name;

pub use archive::{
    Decoder, Header, HeaderPart, PartRange, Variant, decode_archive, extract_archive,
    extract_archive_with, select_variant,
};
pub use checksum::generate_checksum;
pub use cli::Cli;
pub use codec::{Codecs, ExtractedEntry, StandardCodecs};
pub use error::{ArchiveError, CodecError, Result, Stage};
pub use name::{ArchiveExtension, ArchiveKind};
