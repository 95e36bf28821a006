//! MIME multipart decoding for the JWS payload.
//!
//! The WAD payload of a JWS archive is a MIME message whose top-level
//! `Content-Type` is `multipart/*` with a `boundary` parameter. Each body part
//! becomes one entry, named by (in order of preference) the
//! `Content-Disposition` `filename`, the `Content-Type` `name`,
//! `Content-Location`, or `Content-ID`. Parts without any name carry no file
//! and are skipped.
//!
//! `filename` and `name` may use RFC 2231 extended parameters
//! (`filename*=UTF-8''%E6%9B%B8.xml`), split into `filename*0*`, `filename*1*`
//! sections or not.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::codec::ExtractedEntry;
use crate::error::CodecError;

type Result<T> = std::result::Result<T, CodecError>;

fn malformed(msg: impl Into<String>) -> CodecError {
    CodecError::Mime(msg.into())
}

/// Header fields of one message or body part, names lowercased.
#[derive(Debug, Default)]
struct Headers(Vec<(String, String)>);

impl Headers {
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A header value split into its main token and `key=value` parameters.
#[derive(Debug)]
struct HeaderValue {
    value: String,
    params: Vec<(String, String)>,
}

impl HeaderValue {
    fn parse(raw: &str) -> Self {
        let mut segments = split_unquoted(raw, ';').into_iter();
        let value = segments.next().unwrap_or_default().trim().to_string();
        let params = segments
            .filter_map(|seg| {
                let (key, val) = seg.split_once('=')?;
                let val = val.trim();
                let val = val
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(val);
                Some((key.trim().to_ascii_lowercase(), val.to_string()))
            })
            .collect();
        Self { value, params }
    }

    fn raw_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.raw_param(key).filter(|v| !v.is_empty())
    }

    /// Parameter `key` as text, preferring its RFC 2231 extended form.
    fn text_param(&self, key: &str) -> Option<String> {
        self.extended_param(key)
            .or_else(|| self.param(key).map(str::to_string))
    }

    fn extended_param(&self, key: &str) -> Option<String> {
        // (value, percent-encoded) per section, in order.
        let mut sections: Vec<(&str, bool)> = Vec::new();
        if let Some(value) = self.raw_param(&format!("{key}*")) {
            sections.push((value, true));
        } else {
            for n in 0usize.. {
                if let Some(value) = self.raw_param(&format!("{key}*{n}*")) {
                    sections.push((value, true));
                } else if let Some(value) = self.raw_param(&format!("{key}*{n}")) {
                    sections.push((value, false));
                } else {
                    break;
                }
            }
        }

        let mut charset = "";
        let mut bytes = Vec::new();
        for (index, &(value, encoded)) in sections.iter().enumerate() {
            if !encoded {
                bytes.extend_from_slice(value.as_bytes());
                continue;
            }
            let mut text = value;
            if index == 0 {
                // charset'language'text
                let mut fields = value.splitn(3, '\'');
                if let (Some(cs), Some(_), Some(rest)) = (fields.next(), fields.next(), fields.next())
                {
                    charset = cs;
                    text = rest;
                }
            }
            bytes.extend_from_slice(&urlencoding::decode_binary(text.as_bytes()));
        }
        if bytes.is_empty() {
            return None;
        }

        let encoding =
            encoding_rs::Encoding::for_label(charset.as_bytes()).unwrap_or(encoding_rs::UTF_8);
        let (text, _, _) = encoding.decode(&bytes);
        Some(text.into_owned())
    }
}

fn split_unquoted(s: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in s.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c == sep && !quoted => out.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    out.push(current);
    out
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Split a message into its header fields and body.
///
/// The header block ends at the first empty line (CRLF or LF).
fn split_headers(data: &[u8]) -> Result<(Headers, &[u8])> {
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut pos = 0;

    loop {
        let Some(nl) = find(data, b"\n", pos) else {
            return Err(malformed("header block is not terminated by an empty line"));
        };
        let line = &data[pos..nl];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        pos = nl + 1;

        if line.is_empty() {
            return Ok((Headers(headers), &data[pos..]));
        }

        let line = String::from_utf8_lossy(line);
        if line.starts_with([' ', '\t']) {
            // Folded continuation of the previous field.
            let Some((_, value)) = headers.last_mut() else {
                return Err(malformed("continuation line before any header"));
            };
            value.push(' ');
            value.push_str(line.trim());
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(malformed(format!("header line without colon: {line:?}")));
        };
        headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
    }
}

/// Strip one trailing line break (CRLF or LF).
fn trim_line_break(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n")
        .or_else(|| data.strip_suffix(b"\n"))
        .unwrap_or(data)
}

/// Split a multipart body into raw body parts.
fn split_parts<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    // A delimiter line starts with the delimiter, which is followed by `--`,
    // blanks, or the end of the line.
    let is_delimiter_line = |hit: usize| -> bool {
        if hit != 0 && body[hit - 1] != b'\n' {
            return false;
        }
        let rest = &body[hit + delimiter.len()..];
        if rest.starts_with(b"--") {
            return true;
        }
        let line_end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        rest[..line_end]
            .iter()
            .all(|b| matches!(b, b' ' | b'\t' | b'\r'))
    };
    let next_delimiter = |from: usize| -> Option<usize> {
        let mut at = from;
        loop {
            let hit = find(body, delimiter, at)?;
            if is_delimiter_line(hit) {
                return Some(hit);
            }
            at = hit + 1;
        }
    };

    let mut parts = Vec::new();
    let mut at = next_delimiter(0).ok_or_else(|| malformed("boundary not found in body"))?;

    loop {
        let after = at + delimiter.len();
        if body[after..].starts_with(b"--") {
            return Ok(parts);
        }
        let Some(nl) = find(body, b"\n", after) else {
            return Err(malformed("delimiter line is not terminated"));
        };
        let start = nl + 1;
        let Some(next) = next_delimiter(start) else {
            return Err(malformed("closing boundary not found"));
        };
        // The line break before a delimiter belongs to the delimiter.
        parts.push(trim_line_break(&body[start..next]));
        at = next;
    }
}

fn part_name(headers: &Headers) -> Option<String> {
    let disposition = headers.get("content-disposition").map(HeaderValue::parse);
    let content_type = headers.get("content-type").map(HeaderValue::parse);

    disposition
        .as_ref()
        .and_then(|d| d.text_param("filename"))
        .or_else(|| content_type.as_ref().and_then(|t| t.text_param("name")))
        .or_else(|| {
            headers
                .get("content-location")
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .or_else(|| {
            headers
                .get("content-id")
                .map(|id| id.trim_start_matches('<').trim_end_matches('>').to_string())
                .filter(|id| !id.is_empty())
        })
}

fn decode_transfer(encoding: Option<&str>, body: &[u8]) -> Result<Vec<u8>> {
    let encoding = encoding.unwrap_or("7bit").trim().to_ascii_lowercase();
    match encoding.as_str() {
        "7bit" | "8bit" | "binary" => Ok(body.to_vec()),
        "base64" => decode_base64(body),
        other => Err(malformed(format!("unsupported transfer encoding {other:?}"))),
    }
}

/// Standard-alphabet base64 with padding; line breaks and blanks are ignored.
fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let symbols: Vec<u8> = data
        .iter()
        .copied()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(&symbols)
        .map_err(|e| malformed(format!("invalid base64 body: {e}")))
}

/// Decode a MIME multipart message into named parts, in message order.
pub fn mime_decode(data: &[u8]) -> Result<Vec<ExtractedEntry>> {
    let (headers, body) = split_headers(data)?;

    let content_type = headers
        .get("content-type")
        .map(HeaderValue::parse)
        .ok_or_else(|| malformed("missing Content-Type"))?;
    if !content_type
        .value
        .to_ascii_lowercase()
        .starts_with("multipart/")
    {
        return Err(malformed(format!(
            "expected multipart content, found {:?}",
            content_type.value
        )));
    }
    let boundary = content_type
        .param("boundary")
        .ok_or_else(|| malformed("multipart Content-Type without boundary"))?;

    let mut entries = Vec::new();
    for (index, raw) in split_parts(body, boundary)?.into_iter().enumerate() {
        let (part_headers, part_body) = split_headers(raw)?;
        let Some(name) = part_name(&part_headers) else {
            log::debug!("skipping unnamed MIME part {index}");
            continue;
        };
        let content = decode_transfer(part_headers.get("content-transfer-encoding"), part_body)?;
        entries.push(ExtractedEntry::new(name, content));
    }

    Ok(entries)
}
