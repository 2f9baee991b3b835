//! Request-line + header + body writer state machine.
//!
//! This is the write side of the exchange codec (§4.1 "Writing a request"),
//! generalized from the teacher's combined request/response `MessageState`
//! (`base_serializer.rs`) down to the client-only subset this crate needs:
//! a request is always written, a response is always read (never written)
//! by this library.

use std::io::{self, Write};

use thiserror::Error;

use super::version::Version;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("Content-Length is added twice")]
    DuplicateContentLength,
    #[error("Transfer-Encoding is added twice")]
    DuplicateTransferEncoding,
    #[error("header name contains invalid characters")]
    InvalidHeaderName,
    #[error("header value contains invalid characters")]
    InvalidHeaderValue,
    #[error("Transfer-Encoding added when Content-Length is already specified")]
    TransferEncodingAfterContentLength,
    #[error("Content-Length added after Transfer-Encoding")]
    ContentLengthAfterTransferEncoding,
    #[error("Content-Length and Transfer-Encoding must be set using the specialized methods")]
    BodyLengthHeader,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// State of a request being written onto the wire.
///
/// Note: unlike the teacher's version, there is no response-writing half;
/// this library only ever writes requests and reads responses.
#[derive(Debug)]
pub enum RequestWriter {
    /// Nothing written yet.
    Start,
    /// Request line is in the buffer; no body-length header chosen.
    Headers,
    /// `Content-Length` has been written.
    FixedHeaders { content_length: u64 },
    /// `Transfer-Encoding: chunked` has been written.
    ChunkedHeaders,
    /// Headers are done; body is a fixed number of remaining bytes.
    FixedBody { remaining: u64 },
    /// Headers are done; body is chunked.
    ChunkedBody,
    /// The message has been fully written (including any body terminator).
    Done,
}

fn invalid_header(value: &[u8]) -> bool {
    value.iter().any(|&x| x == b'\r' || x == b'\n')
}

impl RequestWriter {
    pub fn new() -> RequestWriter {
        RequestWriter::Start
    }

    /// Write `METHOD SP target SP HTTP/1.1 CRLF`.
    ///
    /// # Panics
    /// If the request line has already been written.
    pub fn request_line<W: Write>(
        &mut self,
        w: &mut W,
        method: &str,
        target: &str,
        version: Version,
    ) -> io::Result<()> {
        match *self {
            RequestWriter::Start => {
                write!(w, "{method} {target} {version}\r\n")?;
                *self = RequestWriter::Headers;
                Ok(())
            }
            ref state => panic!("request_line() called in state {state:?}"),
        }
    }

    fn write_header<W: Write>(&mut self, w: &mut W, name: &str, value: &[u8]) -> Result<(), HeaderError> {
        if invalid_header(name.as_bytes()) {
            return Err(HeaderError::InvalidHeaderName);
        }
        if invalid_header(value) {
            return Err(HeaderError::InvalidHeaderValue);
        }
        w.write_all(name.as_bytes())?;
        w.write_all(b": ")?;
        w.write_all(value)?;
        w.write_all(b"\r\n")?;
        Ok(())
    }

    /// Add an arbitrary header. `Content-Length`/`Transfer-Encoding` must
    /// go through [`Self::add_length`]/[`Self::add_chunked`].
    ///
    /// # Panics
    /// If called before the request line or after headers are finished.
    pub fn add_header<W: Write>(&mut self, w: &mut W, name: &str, value: &[u8]) -> Result<(), HeaderError> {
        if name.eq_ignore_ascii_case("Content-Length") || name.eq_ignore_ascii_case("Transfer-Encoding") {
            return Err(HeaderError::BodyLengthHeader);
        }
        match *self {
            RequestWriter::Headers | RequestWriter::FixedHeaders { .. } | RequestWriter::ChunkedHeaders => {
                self.write_header(w, name, value)
            }
            ref state => panic!("add_header() called in state {state:?}"),
        }
    }

    /// Write `Content-Length: n` and select fixed-length body framing.
    pub fn add_length<W: Write>(&mut self, w: &mut W, n: u64) -> Result<(), HeaderError> {
        match *self {
            RequestWriter::FixedHeaders { .. } => Err(HeaderError::DuplicateContentLength),
            RequestWriter::ChunkedHeaders => Err(HeaderError::ContentLengthAfterTransferEncoding),
            RequestWriter::Headers => {
                self.write_header(w, "Content-Length", n.to_string().as_bytes())?;
                *self = RequestWriter::FixedHeaders { content_length: n };
                Ok(())
            }
            ref state => panic!("add_length() called in state {state:?}"),
        }
    }

    /// Write `Transfer-Encoding: chunked` and select chunked body framing.
    pub fn add_chunked<W: Write>(&mut self, w: &mut W) -> Result<(), HeaderError> {
        match *self {
            RequestWriter::FixedHeaders { .. } => Err(HeaderError::TransferEncodingAfterContentLength),
            RequestWriter::ChunkedHeaders => Err(HeaderError::DuplicateTransferEncoding),
            RequestWriter::Headers => {
                self.write_header(w, "Transfer-Encoding", b"chunked")?;
                *self = RequestWriter::ChunkedHeaders;
                Ok(())
            }
            ref state => panic!("add_chunked() called in state {state:?}"),
        }
    }

    /// Terminate the header block with a blank line. A body-length header
    /// must already have been chosen -- duplex/unknown-length requests are
    /// rejected per §4.1 ("Duplex bodies are explicitly rejected").
    pub fn done_headers<W: Write>(&mut self, w: &mut W) -> Result<(), HeaderError> {
        match *self {
            RequestWriter::FixedHeaders { content_length } => {
                *self = RequestWriter::FixedBody { remaining: content_length };
            }
            RequestWriter::ChunkedHeaders => {
                *self = RequestWriter::ChunkedBody;
            }
            ref state => panic!("done_headers() called in state {state:?}"),
        }
        w.write_all(b"\r\n")?;
        Ok(())
    }

    /// Write a chunk of the request body.
    ///
    /// # Panics
    /// If more bytes are offered than `Content-Length` promised -- this is
    /// the "framing programmer error" of §7, a caller bug, not a runtime
    /// condition.
    pub fn write_body<W: Write>(&mut self, w: &mut W, data: &[u8]) -> io::Result<()> {
        match *self {
            RequestWriter::FixedBody { ref mut remaining } => {
                assert!(
                    data.len() as u64 <= *remaining,
                    "fixed-length body overflow: {} bytes left, got {} more",
                    remaining,
                    data.len()
                );
                w.write_all(data)?;
                *remaining -= data.len() as u64;
                Ok(())
            }
            RequestWriter::ChunkedBody => {
                if !data.is_empty() {
                    write!(w, "{:x}\r\n", data.len())?;
                    w.write_all(data)?;
                    w.write_all(b"\r\n")?;
                }
                Ok(())
            }
            ref state => panic!("write_body() called in state {state:?}"),
        }
    }

    /// Finish the body (and, for chunked bodies, emit the terminating
    /// `0\r\n\r\n`).
    ///
    /// # Panics
    /// If a fixed-length body has not received all of its promised bytes.
    pub fn done<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        match *self {
            RequestWriter::FixedBody { remaining: 0 } => {
                *self = RequestWriter::Done;
                Ok(())
            }
            RequestWriter::FixedBody { remaining } => {
                panic!("tried to close request with {remaining} bytes remaining")
            }
            RequestWriter::ChunkedBody => {
                w.write_all(b"0\r\n\r\n")?;
                *self = RequestWriter::Done;
                Ok(())
            }
            RequestWriter::Done => Ok(()),
            ref state => panic!("done() called in state {state:?}"),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RequestWriter::Done)
    }
}

impl Default for RequestWriter {
    fn default() -> Self {
        RequestWriter::new()
    }
}
