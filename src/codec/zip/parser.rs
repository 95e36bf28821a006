//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures held
//! entirely in memory.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header to locate its data
//!
//! Every offset taken from the archive is checked against the buffer
//! before it is used.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Low-level ZIP parser over a borrowed buffer.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Borrow `len` bytes at `offset`, failing if they run past the buffer.
    pub fn read_at(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let start = usize::try_from(offset)?;
        let len = usize::try_from(len)?;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(&self.data[start..end]),
            _ => bail!(
                "read of {} bytes at offset {} exceeds archive of {} bytes",
                len,
                start,
                self.data.len()
            ),
        }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the buffer).
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            bail!("not a valid ZIP archive ({} bytes)", size);
        }

        // Common case: no comment, EOCD is the last 22 bytes.
        let offset = size - EndOfCentralDirectory::SIZE;
        let buf = &self.data[offset..];
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(buf)?;
            return Ok((eocd, offset as u64));
        }

        // Search backwards for EOCD signature (PK\x05\x06)
        let search_start = size.saturating_sub(MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE);
        let buf = &self.data[search_start..];

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length field must account for every remaining byte.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, (search_start + i) as u64));
                }
            }
        }

        bail!("not a valid ZIP archive (no end of central directory)")
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD indicates ZIP64 extensions are needed
    /// (fields set to 0xFFFF or 0xFFFFFFFF).
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The locator sits immediately before the regular EOCD.
        let Some(locator_offset) = eocd_offset.checked_sub(Zip64EOCDLocator::SIZE as u64) else {
            bail!("ZIP64 end of central directory locator is missing");
        };
        let locator = Zip64EOCDLocator::from_bytes(
            self.read_at(locator_offset, Zip64EOCDLocator::SIZE as u64)?,
        )?;

        Zip64EOCD::from_bytes(self.read_at(locator.eocd64_offset, Zip64EOCD::MIN_SIZE as u64)?)
    }

    /// List all entries in the archive, in central directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_data = self.read_at(cd_offset, cd_size)?;

        // Every entry needs at least a fixed-size header, which bounds the
        // preallocation for hostile entry counts.
        let max_entries = (cd_data.len() / CDFH_MIN_SIZE) as u64;
        if total_entries > max_entries {
            bail!(
                "central directory of {} bytes cannot hold {} entries",
                cd_data.len(),
                total_entries
            );
        }

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..total_entries {
            entries.push(self.parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            bail!("invalid central directory file header");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        let file_name = decode_file_name(&file_name_bytes, flags);

        let is_directory = file_name.ends_with('/');

        // ZIP64 extended information lives in extra field 0x0001; a value is
        // present only when its header field is saturated.
        let extra_field_end = cursor.position() + extra_field_length as u64;
        if extra_field_end > cursor.get_ref().len() as u64 {
            bail!("extra field of {file_name:?} runs past the central directory");
        }

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

            if header_id == 0x0001 {
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }
            cursor.set_position(field_end);
        }

        cursor.set_position(extra_field_end + file_comment_length as u64);

        Ok(ZipFileEntry {
            file_name,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            is_directory,
        })
    }

    /// Get the offset at which an entry's compressed data begins.
    ///
    /// The Local File Header has its own name and extra field lengths,
    /// which may differ from the central directory copy.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let lfh_buf = self.read_at(entry.lfh_offset, LFH_SIZE as u64)?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("invalid local file header for {:?}", entry.file_name);
        }

        let mut cursor = Cursor::new(lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }
}

/// Decode an entry name.
///
/// Without flag bit 11 the name is in the writer's code page. Names that are
/// valid UTF-8 are taken as is; anything else is read as Shift_JIS, which is
/// what Japanese filing tools write.
fn decode_file_name(bytes: &[u8], flags: u16) -> String {
    if flags & FLAG_UTF8 != 0 {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(name) => name.to_string(),
        Err(_) => encoding_rs::SHIFT_JIS
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}
