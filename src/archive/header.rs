//! Fixed 0x16-byte header shared by every supported archive variant.
//!
//! ```text
//! 0x00  opaque preamble (10 bytes)
//! 0x0A  metadata block size   u32 BE
//! 0x0E  first part size       u32 BE
//! 0x12  second part size      u32 BE
//! 0x16  metadata block, first part, second part ...
//! ```
//!
//! All ranges are checked against the buffer; nothing is clamped.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;
use std::ops::Range;

use crate::error::{ArchiveError, Result};

/// Parsed H16 header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub metadata_size: u32,
    pub first_part_size: u32,
    pub second_part_size: u32,
}

impl Header {
    pub const SIZE: usize = 0x16;
    const METADATA_SIZE_OFFSET: u64 = 0x0A;

    /// Parse the header from the start of `data`.
    ///
    /// Only the first [`Header::SIZE`] bytes are read.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(ArchiveError::corrupt_header(format!(
                "archive is {} bytes, header needs {}",
                data.len(),
                Self::SIZE
            )));
        }

        let mut cursor = Cursor::new(&data[..Self::SIZE]);
        cursor.set_position(Self::METADATA_SIZE_OFFSET);

        Ok(Self {
            metadata_size: cursor.read_u32::<BigEndian>()?,
            first_part_size: cursor.read_u32::<BigEndian>()?,
            second_part_size: cursor.read_u32::<BigEndian>()?,
        })
    }
}

/// A `(start, len)` view into the archive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    pub start: usize,
    pub len: usize,
}

impl PartRange {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Borrow the bytes this range covers.
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.as_range()]
    }
}

/// Header arithmetic over one archive buffer.
///
/// Every accessor that yields a [`PartRange`] has already checked it against
/// the buffer length, so [`PartRange::slice`] on the same buffer cannot panic.
#[derive(Debug)]
pub struct HeaderPart<'a> {
    data: &'a [u8],
    header: Header,
}

impl<'a> HeaderPart<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = Header::from_bytes(data)?;
        Ok(Self { data, header })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_size(&self) -> usize {
        Header::SIZE
    }

    pub fn metadata_size(&self) -> usize {
        self.header.metadata_size as usize
    }

    pub fn first_part_size(&self) -> usize {
        self.header.first_part_size as usize
    }

    pub fn second_part_size_field(&self) -> usize {
        self.header.second_part_size as usize
    }

    /// Offset just past the header and metadata block.
    pub fn payload_start(&self) -> Result<usize> {
        let start = self
            .header_size()
            .checked_add(self.metadata_size())
            .ok_or_else(|| ArchiveError::corrupt_header("metadata size overflows"))?;
        if start > self.data.len() {
            return Err(ArchiveError::corrupt_header(format!(
                "metadata block ends at {start}, archive is {} bytes",
                self.data.len()
            )));
        }
        Ok(start)
    }

    /// First part as declared by the first-part size field.
    pub fn first_part_range(&self) -> Result<PartRange> {
        self.checked_range("first part", self.payload_start()?, self.first_part_size())
    }

    /// Second part, from the end of the first part to the end of the archive.
    pub fn second_part_range(&self) -> Result<PartRange> {
        let start = self.first_part_range()?.end();
        self.checked_range("second part", start, self.data.len() - start)
    }

    /// The single JPC payload.
    ///
    /// JPC archives store the length of their only part in the field at 0x12,
    /// the slot other variants use for the second part. The first-part field
    /// is ignored here.
    pub fn jpc_payload_range(&self) -> Result<PartRange> {
        self.checked_range(
            "payload",
            self.payload_start()?,
            self.second_part_size_field(),
        )
    }

    fn checked_range(&self, what: &str, start: usize, len: usize) -> Result<PartRange> {
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(PartRange { start, len }),
            _ => Err(ArchiveError::corrupt_header(format!(
                "{what} of {len} bytes at offset {start} exceeds archive of {} bytes",
                self.data.len()
            ))),
        }
    }
}
