//! Multipart request body writer (§4.5 "Writer").

use std::io::{self, Read, Write};

use crate::headers::Headers;

/// A single part's body: either fully buffered, or a streaming reader whose
/// length may be unknown (which forces the whole message to unknown length).
pub enum PartBody {
    Bytes(Vec<u8>),
    Stream(Box<dyn Read>, Option<u64>),
}

impl PartBody {
    fn len(&self) -> Option<u64> {
        match self {
            PartBody::Bytes(b) => Some(b.len() as u64),
            PartBody::Stream(_, len) => *len,
        }
    }
}

pub struct Part {
    pub headers: Headers,
    pub content_type: Option<String>,
    pub body: PartBody,
}

impl Part {
    pub fn bytes(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Part {
        Part { headers: Headers::new(), content_type: Some(content_type.into()), body: PartBody::Bytes(body.into()) }
    }
}

/// Builds a `multipart/*` body for a fixed boundary (§4.5). Mirrors the
/// exchange codec's own `Write`-target style: callers hand it an output
/// sink rather than it owning one.
pub struct MultipartWriter {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartWriter {
    pub fn new(boundary: impl Into<String>) -> MultipartWriter {
        MultipartWriter { boundary: boundary.into(), parts: Vec::new() }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn add_part(&mut self, part: Part) -> &mut Self {
        self.parts.push(part);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The content length of the full encoded body, or `-1` if any part's
    /// body has unknown length (§4.5).
    pub fn content_length(&self) -> i64 {
        let mut total: u64 = 0;
        for part in &self.parts {
            let Some(body_len) = part.body.len() else {
                return -1;
            };
            total += part_header_len(&self.boundary, part) + body_len + 2; // trailing CRLF
        }
        total += 2 + self.boundary.len() as u64 + 2 + 2; // "--boundary--\r\n"
        total as i64
    }

    /// Write the full encoded body to `out`.
    pub fn write_to<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        for part in &mut self.parts {
            write!(out, "--{}\r\n", self.boundary)?;
            for (name, value) in part.headers.iter() {
                write!(out, "{name}: {value}\r\n")?;
            }
            if let Some(content_type) = &part.content_type {
                write!(out, "Content-Type: {content_type}\r\n")?;
            }
            out.write_all(b"\r\n")?;
            match &mut part.body {
                PartBody::Bytes(bytes) => out.write_all(bytes)?,
                PartBody::Stream(reader, _) => {
                    io::copy(reader, out)?;
                }
            }
            out.write_all(b"\r\n")?;
        }
        write!(out, "--{}--\r\n", self.boundary)
    }
}

fn part_header_len(boundary: &str, part: &Part) -> u64 {
    let mut len = 2 + boundary.len() as u64 + 2; // "--boundary\r\n"
    for (name, value) in part.headers.iter() {
        len += name.len() as u64 + 2 + value.len() as u64 + 2;
    }
    if let Some(content_type) = &part.content_type {
        len += "Content-Type: ".len() as u64 + content_type.len() as u64 + 2;
    }
    len += 2; // blank line
    len
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_known_length_part() {
        let mut writer = MultipartWriter::new("X-BOUNDARY");
        let mut part = Part::bytes("text/plain", b"hello".to_vec());
        part.headers.add("Content-Disposition", "form-data; name=\"field\"");
        writer.add_part(part);

        let mut out = Vec::new();
        writer.write_to(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"field\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n--X-BOUNDARY--\r\n"
        );
        assert_eq!(writer.content_length() as usize, out.len());
    }

    #[test]
    fn unknown_length_stream_forces_minus_one() {
        let mut writer = MultipartWriter::new("B");
        writer.add_part(Part { headers: Headers::new(), content_type: None, body: PartBody::Stream(Box::new(io::empty()), None) });
        assert_eq!(writer.content_length(), -1);
    }

    #[test]
    fn multiple_parts_are_delimited() {
        let mut writer = MultipartWriter::new("B");
        writer.add_part(Part::bytes("text/plain", b"a".to_vec()));
        writer.add_part(Part::bytes("text/plain", b"b".to_vec()));
        let mut out = Vec::new();
        writer.write_to(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("--B\r\n").count(), 2);
        assert!(out.ends_with("--B--\r\n"));
    }
}
