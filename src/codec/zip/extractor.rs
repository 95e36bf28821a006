use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;

use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};
use crate::codec::ExtractedEntry;

/// ZIP file extractor over an in-memory archive
pub struct ZipExtractor<'a> {
    parser: ZipParser<'a>,
}

impl<'a> ZipExtractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            parser: ZipParser::new(data),
        }
    }

    /// List all entries in the archive
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Decompress one entry and verify its CRC-32
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("{:?} is encrypted", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry)?;
        let compressed = self.parser.read_at(data_offset, entry.compressed_size)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed.to_vec(),
            CompressionMethod::Deflate => {
                // Never inflate past the declared size; a lying header shows up
                // as a size or CRC mismatch below.
                let hint = usize::try_from(entry.uncompressed_size)
                    .unwrap_or(usize::MAX)
                    .min(compressed.len().saturating_mul(4));
                let mut buf = Vec::with_capacity(hint);
                DeflateDecoder::new(compressed)
                    .take(entry.uncompressed_size)
                    .read_to_end(&mut buf)
                    .with_context(|| format!("inflating {:?}", entry.file_name))?;
                buf
            }
            CompressionMethod::Unknown(_) => bail!(
                "unsupported compression method {} for {:?}",
                entry.compression_method.as_u16(),
                entry.file_name
            ),
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "{:?} decompressed to {} bytes, expected {}",
                entry.file_name,
                data.len(),
                entry.uncompressed_size
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC mismatch for {:?}: {:08x} != {:08x}",
                entry.file_name,
                crc.sum(),
                entry.crc32
            );
        }

        Ok(data)
    }

    /// Extract every file entry in central directory order, skipping directories
    pub fn extract_all(&self) -> Result<Vec<ExtractedEntry>> {
        self.list_files()?
            .into_iter()
            .filter(|entry| !entry.is_directory)
            .map(|entry| {
                let content = self.extract_to_memory(&entry)?;
                Ok(ExtractedEntry::new(entry.file_name, content))
            })
            .collect()
    }
}
