//! Multipart response body reader (§4.5 "Reader").
//!
//! Generalizes the exchange codec's scanning-buffer pull style (see
//! `http1::body::BodyReader`) to a delimiter the reader has to search for
//! rather than a framing the server announces up front.

use std::io::{BufRead, Read};

use crate::headers::Headers;
use crate::media_type::MediaType;

use super::error::Error;

#[derive(Debug, PartialEq, Eq)]
enum State {
    BeforeFirstPart,
    InBody,
    Terminated,
}

/// Reads the parts of a `multipart/*` body, delimited by `boundary`.
pub struct MultipartReader<R: BufRead> {
    source: R,
    /// `\r\n--<boundary>`, the delimiter a part's body is scanned for.
    pattern: Vec<u8>,
    /// `--<boundary>`, accepted only at the very start (no preamble).
    bare_pattern: Vec<u8>,
    buf: Vec<u8>,
    source_eof: bool,
    state: State,
}

impl<R: BufRead> MultipartReader<R> {
    pub fn new(source: R, boundary: &str) -> MultipartReader<R> {
        MultipartReader {
            source,
            pattern: format!("\r\n--{boundary}").into_bytes(),
            bare_pattern: format!("--{boundary}").into_bytes(),
            buf: Vec::new(),
            source_eof: false,
            state: State::BeforeFirstPart,
        }
    }

    /// Read `boundary` out of a response `Content-Type` header value.
    /// Required per §4.5: a multipart body with no `boundary` parameter
    /// cannot be read.
    pub fn boundary_from_content_type(content_type: &str) -> Result<String, Error> {
        let media_type = MediaType::parse(content_type).map_err(|_| Error::MissingBoundary)?;
        media_type.param("boundary").map(str::to_string).ok_or(Error::MissingBoundary)
    }

    /// Advance past the next boundary and read the following part's
    /// headers. `Ok(None)` means the closing `--boundary--` was reached.
    pub fn next_part(&mut self) -> Result<Option<Headers>, Error> {
        match self.state {
            State::Terminated => return Ok(None),
            State::BeforeFirstPart => self.consume_leading_boundary()?,
            State::InBody => self.skip_to_boundary()?,
        }

        let trailer = self.read_line()?;
        if trailer.starts_with("--") {
            self.state = State::Terminated;
            return Ok(None);
        }
        if !trailer.trim().is_empty() {
            return Err(Error::BadDelimiterLine(trailer));
        }

        let headers = self.read_headers()?;
        self.state = State::InBody;
        Ok(Some(headers))
    }

    /// Read up to `out.len()` bytes of the current part's body. Returns
    /// `Ok(0)` at the part's boundary; call [`next_part`](Self::next_part)
    /// to advance. Calling this outside [`State::InBody`] is the "reading
    /// past `nextPart`" error case.
    pub fn read_body(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        if self.state != State::InBody {
            return Err(Error::ReadPastBoundary);
        }
        loop {
            if let Some(idx) = find(&self.buf, &self.pattern) {
                if idx == 0 {
                    return Ok(0);
                }
                let n = idx.min(out.len());
                out[..n].copy_from_slice(&self.buf[..n]);
                self.buf.drain(..n);
                return Ok(n);
            }
            let safe_len = self.buf.len().saturating_sub(self.pattern.len().saturating_sub(1));
            if safe_len > 0 {
                let n = safe_len.min(out.len());
                out[..n].copy_from_slice(&self.buf[..n]);
                self.buf.drain(..n);
                return Ok(n);
            }
            if self.source_eof {
                return Err(Error::UnexpectedEof);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<(), Error> {
        let mut chunk = [0u8; 4096];
        let n = self.source.read(&mut chunk)?;
        if n == 0 {
            self.source_eof = true;
        } else {
            self.buf.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    fn consume_leading_boundary(&mut self) -> Result<(), Error> {
        loop {
            if self.buf.starts_with(&self.bare_pattern) {
                self.buf.drain(..self.bare_pattern.len());
                return Ok(());
            }
            if let Some(idx) = find(&self.buf, &self.pattern) {
                self.buf.drain(..idx + self.pattern.len());
                return Ok(());
            }
            if self.source_eof {
                return Err(Error::UnexpectedEof);
            }
            self.fill()?;
        }
    }

    /// Consume any unread body bytes plus the boundary delimiter itself, so
    /// that `next_part` is safe to call whether or not the previous part's
    /// body was read to completion.
    fn skip_to_boundary(&mut self) -> Result<(), Error> {
        loop {
            if let Some(idx) = find(&self.buf, &self.pattern) {
                self.buf.drain(..idx + self.pattern.len());
                return Ok(());
            }
            if self.source_eof {
                return Err(Error::UnexpectedEof);
            }
            let keep_from = self.buf.len().saturating_sub(self.pattern.len().saturating_sub(1));
            self.buf.drain(..keep_from);
            self.fill()?;
        }
    }

    /// Read and consume up to and including the next `\r\n`, returning the
    /// text before it.
    fn read_line(&mut self) -> Result<String, Error> {
        loop {
            if let Some(idx) = find(&self.buf, b"\r\n") {
                let line: Vec<u8> = self.buf.drain(..idx + 2).collect();
                return Ok(String::from_utf8_lossy(&line[..idx]).into_owned());
            }
            if self.source_eof {
                return Err(Error::UnexpectedEof);
            }
            self.fill()?;
        }
    }

    fn read_headers(&mut self) -> Result<Headers, Error> {
        let mut headers = Headers::new();
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                return Ok(headers);
            }
            headers.parse_line(&line)?;
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn read_part_body<R: BufRead>(reader: &mut MultipartReader<R>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = reader.read_body(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn reads_two_parts_with_no_preamble() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nhello\r\n--B\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\nworld\r\n--B--\r\n";
        let mut reader = MultipartReader::new(Cursor::new(body.to_vec()), "B");

        let headers = reader.next_part().unwrap().unwrap();
        assert_eq!(headers.get("Content-Disposition"), Some("form-data; name=\"a\""));
        assert_eq!(read_part_body(&mut reader), b"hello");

        let headers = reader.next_part().unwrap().unwrap();
        assert_eq!(headers.get("Content-Disposition"), Some("form-data; name=\"b\""));
        assert_eq!(read_part_body(&mut reader), b"world");

        assert!(reader.next_part().unwrap().is_none());
    }

    #[test]
    fn reads_with_preamble_text() {
        let body = b"this is ignored\r\n--B\r\n\r\ndata\r\n--B--\r\n";
        let mut reader = MultipartReader::new(Cursor::new(body.to_vec()), "B");
        reader.next_part().unwrap().unwrap();
        assert_eq!(read_part_body(&mut reader), b"data");
    }

    #[test]
    fn skips_unread_part_body_before_next_part() {
        let body = b"--B\r\n\r\nskip-me-entirely\r\n--B\r\n\r\nsecond\r\n--B--\r\n";
        let mut reader = MultipartReader::new(Cursor::new(body.to_vec()), "B");
        reader.next_part().unwrap().unwrap();
        // Don't read the first part's body at all.
        reader.next_part().unwrap().unwrap();
        assert_eq!(read_part_body(&mut reader), b"second");
    }

    #[test]
    fn boundary_from_content_type_requires_parameter() {
        assert_eq!(MultipartReader::<Cursor<Vec<u8>>>::boundary_from_content_type("multipart/form-data; boundary=XYZ").unwrap(), "XYZ");
        assert!(MultipartReader::<Cursor<Vec<u8>>>::boundary_from_content_type("multipart/form-data").is_err());
    }

    #[test]
    fn truncated_body_is_an_error() {
        let body = b"--B\r\n\r\nhalf";
        let mut reader = MultipartReader::new(Cursor::new(body.to_vec()), "B");
        reader.next_part().unwrap().unwrap();
        let mut out = [0u8; 16];
        assert!(reader.read_body(&mut out).is_err());
    }
}
