#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::PathBuf;

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// A ZIP archive holding `entries` in order, deflated.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn der(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = body.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = (len as u32).to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        out.push(0x80 | (4 - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(body);
    out
}

/// A WAD blob: CMS-style signed data encapsulating `payload`.
pub fn wad_blob(payload: &[u8]) -> Vec<u8> {
    let signed_data_oid = der(0x06, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02]);
    let data_oid = der(0x06, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01]);
    let encap = der(0x30, &[data_oid, der(0xA0, &der(0x04, payload))].concat());
    let signer_infos = der(0x31, &der(0x30, &[der(0x02, &[1]), der(0x80, b"kid")].concat()));
    let signed = der(
        0x30,
        &[der(0x02, &[1]), der(0x31, &[]), encap, signer_infos].concat(),
    );
    der(0x30, &[signed_data_oid, der(0xA0, &signed)].concat())
}

/// A multipart MIME message with one attachment per entry.
pub fn mime_message(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let boundary = "----=_Part_0_1234567890";
    let mut out = format!(
        "MIME-Version: 1.0\r\nContent-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
    )
    .into_bytes();
    for (name, data) in entries {
        out.extend_from_slice(
            format!(
                "--{boundary}\r\n\
                 Content-Type: application/octet-stream\r\n\
                 Content-Disposition: attachment; filename=\"{name}\"\r\n\
                 Content-Transfer-Encoding: binary\r\n\r\n"
            )
            .as_bytes(),
        );
        out.extend_from_slice(data);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

/// Raw H16 archive bytes.
pub struct ArchiveBuilder {
    pub metadata: Vec<u8>,
    pub first: Vec<u8>,
    pub second: Vec<u8>,
    pub first_size_field: Option<u32>,
    pub second_size_field: Option<u32>,
}

impl ArchiveBuilder {
    pub fn new(first: Vec<u8>, second: Vec<u8>) -> Self {
        Self {
            metadata: b"<meta>office metadata</meta>".to_vec(),
            first,
            second,
            first_size_field: None,
            second_size_field: None,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = b"\x00\x01EFILE\x00\x00\x00".to_vec();
        assert_eq!(data.len(), 10);
        let first_size = self.first_size_field.unwrap_or(self.first.len() as u32);
        let second_size = self.second_size_field.unwrap_or(self.second.len() as u32);
        data.extend_from_slice(&(self.metadata.len() as u32).to_be_bytes());
        data.extend_from_slice(&first_size.to_be_bytes());
        data.extend_from_slice(&second_size.to_be_bytes());
        data.extend_from_slice(&self.metadata);
        data.extend_from_slice(&self.first);
        data.extend_from_slice(&self.second);
        data
    }
}

/// Writes archives into a temporary directory that lives as long as this value.
pub struct Inbox {
    dir: tempfile::TempDir,
}

impl Inbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn put(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn names(entries: &[efiling_archive::ExtractedEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}
