//! In-memory ZIP decoding.
//!
//! Both the first part of an archive and the payload of JWX/JPD WAD blobs are
//! ordinary ZIP archives.
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP format records (EOCD, ZIP64 records, file entries)
//! - [`parser`]: bounds-checked parsing of those records from a byte slice
//! - [`extractor`]: decompression and CRC verification of entries
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 end records and extra fields
//! - STORED and DEFLATE methods
//! - Archive comments
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;

use super::ExtractedEntry;

/// Decode a ZIP archive into its file entries, in central directory order.
pub fn unzip(data: &[u8]) -> anyhow::Result<Vec<ExtractedEntry>> {
    ZipExtractor::new(data).extract_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use ::zip::CompressionMethod as Method;
    use ::zip::write::SimpleFileOptions;

    fn build(entries: &[(&str, &[u8], Method)], comment: &str) -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data, method) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default().compression_method(*method))
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.set_comment(comment);
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_stored_and_deflated_in_order() {
        let big = b"<doc>".repeat(500);
        let data = build(
            &[
                ("b.xml", big.as_slice(), Method::Deflated),
                ("a.tif", b"II*\0raster".as_slice(), Method::Stored),
            ],
            "",
        );
        let entries = unzip(&data).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b.xml", "a.tif"]);
        assert_eq!(entries[0].content, big);
        assert_eq!(entries[1].content, b"II*\0raster");
    }

    #[test]
    fn finds_eocd_behind_comment() {
        let data = build(&[("x.xml", b"<x/>".as_slice(), Method::Stored)], "issued by the office");
        let entries = unzip(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "x.xml");
    }

    #[test]
    fn skips_directory_entries() {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("images/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file(
                "images/1.tif",
                SimpleFileOptions::default().compression_method(Method::Stored),
            )
            .unwrap();
        writer.write_all(b"tif").unwrap();
        let data = writer.finish().unwrap().into_inner();

        let entries = unzip(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "images/1.tif");
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let data = build(&[], "");
        assert!(unzip(&data).unwrap().is_empty());
    }

    #[test]
    fn corrupted_content_fails_crc() {
        let mut data = build(&[("x.xml", b"<payload/>".as_slice(), Method::Stored)], "");
        let at = data.windows(10).position(|w| w == b"<payload/>").unwrap();
        data[at] = b'[';
        let err = unzip(&data).unwrap_err();
        assert!(err.to_string().contains("CRC mismatch"), "{err}");
    }

    #[test]
    fn truncated_archive_is_rejected() {
        let data = build(&[("x.xml", b"<x/>".as_slice(), Method::Stored)], "");
        assert!(unzip(&data[..data.len() - 1]).is_err());
        assert!(unzip(b"PK").is_err());
        assert!(unzip(b"").is_err());
    }

    #[test]
    fn central_directory_offset_out_of_range_is_rejected() {
        let mut data = build(&[("x.xml", b"<x/>".as_slice(), Method::Stored)], "");
        let eocd = data.len() - EndOfCentralDirectory::SIZE;
        data[eocd + 16..eocd + 20].copy_from_slice(&u32::MAX.wrapping_sub(1).to_le_bytes());
        assert!(unzip(&data).is_err());
    }
}
