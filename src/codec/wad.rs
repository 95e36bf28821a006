//! WAD blob payload extraction.
//!
//! The second part of JWX, JWS and JPD archives is a signed envelope encoded
//! in BER/DER (CMS `SignedData` shape). The logical payload is the content of
//! the first OCTET STRING met in a depth-first walk, which is where the
//! encapsulated content sits. A constructed OCTET STRING is the concatenation
//! of its segments.
//!
//! Definite and indefinite lengths are both accepted. Nothing is returned
//! unless the whole path to the payload parses.

use crate::error::CodecError;

/// Nesting limit for constructed elements.
const MAX_DEPTH: usize = 32;

const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OCTET_STRING_CONSTRUCTED: u8 = 0x24;
const CONSTRUCTED: u8 = 0x20;

type Result<T> = std::result::Result<T, CodecError>;

fn malformed(msg: impl Into<String>) -> CodecError {
    CodecError::Wad(msg.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Length {
    Definite(usize),
    Indefinite,
}

/// Identifier and length octets of one element.
#[derive(Debug)]
struct ElementHeader {
    /// First identifier octet; class, constructed bit and low tag number.
    tag: u8,
    header_len: usize,
    length: Length,
}

impl ElementHeader {
    fn parse(data: &[u8]) -> Result<Self> {
        let &tag = data.first().ok_or_else(|| malformed("unexpected end of data"))?;
        let mut pos = 1;

        // High tag numbers continue in base-128 octets.
        if tag & 0x1F == 0x1F {
            loop {
                let &b = data
                    .get(pos)
                    .ok_or_else(|| malformed("truncated tag number"))?;
                pos += 1;
                if pos > 6 {
                    return Err(malformed("tag number too large"));
                }
                if b & 0x80 == 0 {
                    break;
                }
            }
        }

        let &first = data.get(pos).ok_or_else(|| malformed("truncated length"))?;
        pos += 1;

        let length = match first {
            0x00..=0x7F => Length::Definite(first as usize),
            0x80 => Length::Indefinite,
            0x81..=0x88 => {
                let n = (first & 0x7F) as usize;
                let bytes = data
                    .get(pos..pos + n)
                    .ok_or_else(|| malformed("truncated long-form length"))?;
                pos += n;
                let value = bytes
                    .iter()
                    .try_fold(0usize, |acc, &b| acc.checked_mul(256)?.checked_add(b as usize))
                    .ok_or_else(|| malformed("length overflows"))?;
                Length::Definite(value)
            }
            _ => return Err(malformed(format!("invalid length octet 0x{first:02x}"))),
        };

        if length == Length::Indefinite && tag & CONSTRUCTED == 0 {
            return Err(malformed("indefinite length on a primitive element"));
        }

        Ok(Self {
            tag,
            header_len: pos,
            length,
        })
    }

    fn is_constructed(&self) -> bool {
        self.tag & CONSTRUCTED != 0
    }
}

/// Outcome of walking one element.
enum Walk {
    /// Payload found; the walk stops here.
    Found(Vec<u8>),
    /// No payload inside; the element spans this many bytes.
    Skipped(usize),
}

/// Bytes of a definite-length body, bounds-checked.
fn definite_body<'a>(data: &'a [u8], header: &ElementHeader, len: usize) -> Result<&'a [u8]> {
    header
        .header_len
        .checked_add(len)
        .and_then(|end| data.get(header.header_len..end))
        .ok_or_else(|| {
            malformed(format!(
                "element of {len} bytes runs past the end of {} bytes",
                data.len()
            ))
        })
}

fn walk(data: &[u8], depth: usize) -> Result<Walk> {
    if depth > MAX_DEPTH {
        return Err(malformed("nesting too deep"));
    }

    let header = ElementHeader::parse(data)?;

    if header.tag == TAG_OCTET_STRING_CONSTRUCTED {
        return collect_segments(data, &header, depth).map(|(payload, _)| Walk::Found(payload));
    }

    match (header.is_constructed(), header.length) {
        (false, Length::Definite(len)) => {
            let body = definite_body(data, &header, len)?;
            Ok(if header.tag == TAG_OCTET_STRING {
                Walk::Found(body.to_vec())
            } else {
                Walk::Skipped(header.header_len + len)
            })
        }
        (false, Length::Indefinite) => Err(malformed("indefinite length on a primitive element")),
        (true, Length::Definite(len)) => {
            let body = definite_body(data, &header, len)?;
            let mut pos = 0;
            while pos < body.len() {
                match walk(&body[pos..], depth + 1)? {
                    Walk::Found(payload) => return Ok(Walk::Found(payload)),
                    Walk::Skipped(n) => pos += n,
                }
            }
            Ok(Walk::Skipped(header.header_len + len))
        }
        (true, Length::Indefinite) => {
            let mut pos = header.header_len;
            loop {
                let rest = &data[pos..];
                if rest.starts_with(&[0, 0]) {
                    return Ok(Walk::Skipped(pos + 2));
                }
                if rest.is_empty() {
                    return Err(malformed("missing end-of-contents"));
                }
                match walk(rest, depth + 1)? {
                    Walk::Found(payload) => return Ok(Walk::Found(payload)),
                    Walk::Skipped(n) => pos += n,
                }
            }
        }
    }
}

/// Concatenate the segments of a constructed OCTET STRING.
///
/// Returns the payload and the number of bytes the element spans.
fn collect_segments(data: &[u8], header: &ElementHeader, depth: usize) -> Result<(Vec<u8>, usize)> {
    if depth > MAX_DEPTH {
        return Err(malformed("nesting too deep"));
    }

    let (body, indefinite) = match header.length {
        Length::Definite(len) => (definite_body(data, header, len)?, false),
        Length::Indefinite => (&data[header.header_len..], true),
    };

    let mut payload = Vec::new();
    let mut pos = 0;
    loop {
        let rest = &body[pos..];
        if indefinite && rest.starts_with(&[0, 0]) {
            return Ok((payload, header.header_len + pos + 2));
        }
        if rest.is_empty() {
            if indefinite {
                return Err(malformed("missing end-of-contents"));
            }
            return Ok((payload, header.header_len + pos));
        }

        let segment = ElementHeader::parse(rest)?;
        match (segment.tag, segment.length) {
            (TAG_OCTET_STRING, Length::Definite(len)) => {
                payload.extend_from_slice(definite_body(rest, &segment, len)?);
                pos += segment.header_len + len;
            }
            (TAG_OCTET_STRING_CONSTRUCTED, _) => {
                let (inner, consumed) = collect_segments(rest, &segment, depth + 1)?;
                payload.extend_from_slice(&inner);
                pos += consumed;
            }
            (tag, _) => {
                return Err(malformed(format!(
                    "segment with tag 0x{tag:02x} inside a constructed OCTET STRING"
                )));
            }
        }
    }
}

/// Extract the payload of a WAD blob.
pub fn wad_extract(data: &[u8]) -> Result<Vec<u8>> {
    let header = ElementHeader::parse(data)?;
    if !header.is_constructed() {
        return Err(malformed(format!(
            "envelope starts with primitive tag 0x{:02x}",
            header.tag
        )));
    }

    match walk(data, 0)? {
        Walk::Found(payload) => Ok(payload),
        Walk::Skipped(_) => Err(malformed("no payload in envelope")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        match body.len() {
            n @ 0..=0x7F => out.push(n as u8),
            n @ 0x80..=0xFF => out.extend_from_slice(&[0x81, n as u8]),
            n => {
                out.push(0x82);
                out.extend_from_slice(&(n as u16).to_be_bytes());
            }
        }
        out.extend_from_slice(body);
        out
    }

    fn signed_data(payload: &[u8]) -> Vec<u8> {
        let oid = tlv(0x06, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02]);
        let version = tlv(0x02, &[0x01]);
        let digest_algs = tlv(0x31, &tlv(0x30, &tlv(0x06, &[0x60, 0x86, 0x48])));
        let econtent = tlv(0xA0, &tlv(TAG_OCTET_STRING, payload));
        let encap = tlv(0x30, &[tlv(0x06, &[0x2A, 0x03]), econtent].concat());
        let signed = tlv(0x30, &[version, digest_algs, encap].concat());
        tlv(0x30, &[oid, tlv(0xA0, &signed)].concat())
    }

    #[test]
    fn extracts_encapsulated_content() {
        let payload = b"PK\x03\x04 zip bytes".repeat(20);
        assert_eq!(wad_extract(&signed_data(&payload)).unwrap(), payload);
    }

    #[test]
    fn concatenates_constructed_octet_string() {
        let mut segmented = vec![TAG_OCTET_STRING_CONSTRUCTED, 0x80];
        segmented.extend(tlv(TAG_OCTET_STRING, b"MIME-"));
        segmented.extend(tlv(TAG_OCTET_STRING, b"Version"));
        segmented.extend([0, 0]);

        let mut blob = vec![0x30, 0x80];
        blob.extend(tlv(0x06, &[0x2A, 0x03]));
        blob.extend(tlv(0xA0, &segmented));
        blob.extend([0, 0]);

        assert_eq!(wad_extract(&blob).unwrap(), b"MIME-Version");
    }

    #[test]
    fn skips_indefinite_siblings_before_payload() {
        let mut blob = vec![0x30, 0x80];
        blob.extend([0x31, 0x80]);
        blob.extend(tlv(0x02, &[0x05]));
        blob.extend([0, 0]);
        blob.extend(tlv(TAG_OCTET_STRING, b"payload"));
        blob.extend([0, 0]);

        assert_eq!(wad_extract(&blob).unwrap(), b"payload");
    }

    #[test]
    fn context_tagged_primitive_is_not_payload() {
        let blob = tlv(0x30, &[tlv(0x80, b"key id"), tlv(TAG_OCTET_STRING, b"yes")].concat());
        assert_eq!(wad_extract(&blob).unwrap(), b"yes");
    }

    #[test]
    fn envelope_without_payload_fails() {
        let blob = tlv(0x30, &tlv(0x02, &[0x01]));
        assert!(matches!(wad_extract(&blob), Err(CodecError::Wad(_))));
    }

    #[test]
    fn truncated_envelope_fails_without_partial_data() {
        let blob = signed_data(b"some payload bytes");
        for cut in [1, 5, blob.len() / 2, blob.len() - 1] {
            assert!(wad_extract(&blob[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn primitive_envelope_fails() {
        assert!(wad_extract(&tlv(TAG_OCTET_STRING, b"bare")).is_err());
        assert!(wad_extract(b"").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut blob = tlv(TAG_OCTET_STRING, b"x");
        for _ in 0..=MAX_DEPTH + 1 {
            blob = tlv(0x30, &blob);
        }
        assert!(wad_extract(&blob).is_err());
    }

    #[test]
    fn huge_declared_length_is_rejected() {
        let blob = [0x30, 0x88, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(wad_extract(&blob).is_err());
    }
}
