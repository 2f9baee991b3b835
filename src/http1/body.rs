//! Response body framers: fixed-length, chunked, and unknown-length
//! (stream-until-EOF). Generalizes the teacher's `chunked::State` (a
//! buffer-scanning chunk-size tracker) into a pull-based `Read` impl that
//! also understands fixed and EOF-terminated bodies, per §4.1's "Choosing
//! a response body framer" / §9's "single tagged variant" design note.

use std::io::{self, BufRead, Read};

use crate::headers::Headers;

use super::error::Error;
use super::trailers::Trailers;
use crate::socket::BufReadExt;

#[derive(Debug)]
enum ChunkPhase {
    /// Waiting for the next `hex-size[;ext]\r\n` line.
    Header,
    /// `remaining` bytes of chunk data left, then a CRLF to consume.
    Data { remaining: u64 },
    /// Just finished a chunk's data; the trailing CRLF hasn't been read yet.
    DataCrlf,
    /// Reading trailer header lines until a blank line.
    TrailerLines { headers: Headers },
    Done,
}

/// The body framer chosen for a single response, per §4.1.
#[derive(Debug)]
pub enum BodyReader {
    Fixed { remaining: u64, trailers: Trailers },
    Chunked { phase: ChunkPhase, trailers: Trailers },
    /// Reads until EOF. Constructing this variant marks the owning
    /// connection non-reusable (§9 design note): pooling is lost even if
    /// the server happens to close correctly after the body.
    Unknown { trailers: Trailers, eof: bool },
}

const MAX_CHUNK_LINE: usize = 4096;
const MAX_TRAILER_LINE: usize = 64 * 1024;

impl BodyReader {
    pub fn fixed(len: u64) -> BodyReader {
        if len == 0 {
            BodyReader::Fixed { remaining: 0, trailers: Trailers::Headers(Headers::new()) }
        } else {
            BodyReader::Fixed { remaining: len, trailers: Trailers::None }
        }
    }

    pub fn chunked() -> BodyReader {
        BodyReader::Chunked { phase: ChunkPhase::Header, trailers: Trailers::None }
    }

    pub fn unknown_length() -> BodyReader {
        BodyReader::Unknown { trailers: Trailers::None, eof: false }
    }

    pub fn trailers(&self) -> &Trailers {
        match self {
            BodyReader::Fixed { trailers, .. } => trailers,
            BodyReader::Chunked { trailers, .. } => trailers,
            BodyReader::Unknown { trailers, .. } => trailers,
        }
    }

    pub fn is_done(&self) -> bool {
        !matches!(self.trailers(), Trailers::None)
    }

    /// Read up to `buf.len()` bytes from `source` into `buf`.
    pub fn read<R: BufRead>(&mut self, source: &mut R, buf: &mut [u8]) -> Result<usize, Error> {
        match self {
            BodyReader::Fixed { remaining, trailers } => {
                if *remaining == 0 {
                    return Ok(0);
                }
                let want = std::cmp::min(*remaining, buf.len() as u64) as usize;
                let n = source.read(&mut buf[..want])?;
                if n == 0 {
                    *trailers = Trailers::Truncated;
                    return Err(Error::EndOfStream {
                        context: "fixed-length body",
                        redacted_url: String::new(),
                    });
                }
                *remaining -= n as u64;
                if *remaining == 0 {
                    *trailers = Trailers::Headers(Headers::new());
                }
                Ok(n)
            }
            BodyReader::Chunked { phase, trailers } => {
                loop {
                    match phase {
                        ChunkPhase::Header => {
                            let (size, _ext) = source.read_hex_line(MAX_CHUNK_LINE)
                                .map_err(map_chunk_size_error)?;
                            if size == 0 {
                                *phase = ChunkPhase::TrailerLines { headers: Headers::new() };
                            } else {
                                *phase = ChunkPhase::Data { remaining: size };
                            }
                        }
                        ChunkPhase::Data { remaining } => {
                            if *remaining == 0 {
                                *phase = ChunkPhase::DataCrlf;
                                continue;
                            }
                            let want = std::cmp::min(*remaining, buf.len() as u64) as usize;
                            let n = source.read(&mut buf[..want])?;
                            if n == 0 {
                                *trailers = Trailers::Truncated;
                                return Err(Error::EndOfStream {
                                    context: "chunk body",
                                    redacted_url: String::new(),
                                });
                            }
                            *remaining -= n as u64;
                            return Ok(n);
                        }
                        ChunkPhase::DataCrlf => {
                            let line = source.read_line_bounded(2)
                                .map_err(|e| map_eof(e, "chunk terminator"))?;
                            if !line.is_empty() {
                                return Err(Error::BadChunkSize(line));
                            }
                            *phase = ChunkPhase::Header;
                        }
                        ChunkPhase::TrailerLines { headers } => {
                            let line = source.read_line_bounded(MAX_TRAILER_LINE)
                                .map_err(|e| map_eof(e, "trailers"))?;
                            if line.is_empty() {
                                *trailers = Trailers::Headers(std::mem::take(headers));
                                *phase = ChunkPhase::Done;
                                return Ok(0);
                            }
                            headers.parse_line(&line)?;
                        }
                        ChunkPhase::Done => return Ok(0),
                    }
                }
            }
            BodyReader::Unknown { trailers, eof } => {
                if *eof {
                    return Ok(0);
                }
                let n = source.read(buf)?;
                if n == 0 {
                    *eof = true;
                    *trailers = Trailers::Headers(Headers::new());
                }
                Ok(n)
            }
        }
    }
}

fn map_eof(err: io::Error, context: &'static str) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::EndOfStream { context, redacted_url: String::new() }
    } else {
        Error::Io(err)
    }
}

/// A malformed chunk-size line (bad hex digits, or an extension tail not
/// starting with `;`) is a protocol error, not an I/O error (§4.1, §7) —
/// `read_hex_line` reports both that and premature EOF as `io::Error`,
/// since it's a generic `BufRead` helper with no HTTP-specific error type.
fn map_chunk_size_error(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::EndOfStream { context: "chunk size line", redacted_url: String::new() },
        io::ErrorKind::InvalidData => Error::BadChunkSize(err.to_string()),
        _ => Error::Io(err),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn fixed_length_round_trip() {
        let mut source = Cursor::new(b"hello".to_vec());
        let mut reader = BodyReader::fixed(5);
        let mut out = Vec::new();
        let mut buf = [0u8; 2];
        loop {
            let n = reader.read(&mut source, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"hello");
        assert_eq!(reader.trailers(), &Trailers::Headers(Headers::new()));
    }

    #[test]
    fn fixed_length_truncated() {
        let mut source = Cursor::new(b"hel".to_vec());
        let mut reader = BodyReader::fixed(5);
        let mut buf = [0u8; 16];
        let mut total = 0;
        let err = loop {
            match reader.read(&mut source, &mut buf) {
                Ok(0) => panic!("expected truncation error before EOF"),
                Ok(n) => total += n,
                Err(e) => break e,
            }
        };
        assert!(matches!(err, Error::EndOfStream { .. }));
        assert_eq!(total, 3);
        assert!(reader.trailers().is_truncated());
    }

    #[test]
    fn chunked_with_trailers() {
        let mut source = Cursor::new(b"5\r\nhello\r\n6\r\n world\r\n0\r\nX-Extra: yes\r\n\r\n".to_vec());
        let mut reader = BodyReader::chunked();
        let mut out = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = reader.read(&mut source, &mut buf).unwrap();
            if n == 0 && reader.is_done() {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"hello world");
        match reader.trailers().peek().unwrap() {
            Some(h) => assert_eq!(h.get("X-Extra"), Some("yes")),
            None => panic!("expected trailers"),
        }
    }

    #[test]
    fn malformed_chunk_size_is_a_protocol_error_not_io() {
        let mut source = Cursor::new(b"not-hex\r\n".to_vec());
        let mut reader = BodyReader::chunked();
        let mut buf = [0u8; 4];
        let err = reader.read(&mut source, &mut buf).unwrap_err();
        assert!(matches!(err, Error::BadChunkSize(_)), "expected BadChunkSize, got {err:?}");
    }

    #[test]
    fn unknown_length_streams_to_eof() {
        let mut source = Cursor::new(b"abcdef".to_vec());
        let mut reader = BodyReader::unknown_length();
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            let n = reader.read(&mut source, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"abcdef");
        assert!(!reader.trailers().is_truncated());
    }
}
