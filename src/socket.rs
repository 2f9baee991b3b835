//! The `Socket` collaborator: a byte-oriented duplex transport with the
//! small set of buffered operations the HTTP/1.1 codec and the WebSocket
//! framer need. The TLS handshake, connection pooling and route planning
//! that produce a `Socket` are out of scope here (§1); this module only
//! describes the contract and a couple of concrete implementations used
//! by tests.

use std::io::{self, BufRead, Read, Write};

/// Anything that can serve as the transport for one exchange or one
/// WebSocket session: a buffered byte source plus a byte sink.
///
/// Implemented for any `(R, W)` pair where `R: BufRead` and `W: Write`,
/// and for [`DuplexBuffer`] used in tests.
pub trait Socket {
    type Read: BufRead;
    type Write: Write;

    fn reader(&mut self) -> &mut Self::Read;
    fn writer(&mut self) -> &mut Self::Write;

    fn close(&mut self) -> io::Result<()> {
        self.writer().flush()
    }
}

/// Extension operations the exchange codec and WebSocket reader need on
/// top of plain `BufRead`.
pub trait BufReadExt: BufRead {
    /// Read a CRLF- or LF-terminated line, stripping the terminator, and
    /// failing if it (including the terminator) would exceed `max_len`.
    fn read_line_bounded(&mut self, max_len: usize) -> io::Result<String> {
        let mut raw = Vec::new();
        let mut budget = max_len;
        loop {
            let mut byte = [0u8; 1];
            let n = self.read(&mut byte)?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "eof before end of line",
                ));
            }
            if budget == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "line exceeds budget",
                ));
            }
            budget -= 1;
            if byte[0] == b'\n' {
                while raw.last() == Some(&b'\r') {
                    raw.pop();
                }
                return String::from_utf8(raw)
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-utf8 line"));
            }
            raw.push(byte[0]);
        }
    }

    /// Reads a run of ASCII hex digits terminated by CRLF (chunk-size line,
    /// `;extension` tail allowed), returning the parsed value.
    fn read_hex_line(&mut self, max_len: usize) -> io::Result<(u64, String)> {
        let line = self.read_line_bounded(max_len)?;
        let hex_end = line.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(line.len());
        if hex_end == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "empty chunk size"));
        }
        let value = u64::from_str_radix(&line[..hex_end], 16)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "bad chunk size"))?;
        let rest = &line[hex_end..];
        if !rest.is_empty() && !rest.starts_with(';') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "chunk extension must start with ';'",
            ));
        }
        Ok((value, rest.to_string()))
    }
}

impl<T: BufRead + ?Sized> BufReadExt for T {}

/// Any buffered reader paired with a writer is a `Socket` — a real TLS or
/// TCP stream wrapped in `std::io::BufReader` on one side and used
/// directly (or itself buffered) as the writer on the other.
impl<R: BufRead, W: Write> Socket for (R, W) {
    type Read = R;
    type Write = W;

    fn reader(&mut self) -> &mut Self::Read {
        &mut self.0
    }

    fn writer(&mut self) -> &mut Self::Write {
        &mut self.1
    }
}

/// An in-memory duplex pair standing in for a real transport in tests:
/// writes go to `output`, reads come from `input`.
pub struct DuplexBuffer {
    pub input: io::Cursor<Vec<u8>>,
    pub output: Vec<u8>,
}

impl DuplexBuffer {
    pub fn new(input: impl Into<Vec<u8>>) -> DuplexBuffer {
        DuplexBuffer { input: io::Cursor::new(input.into()), output: Vec::new() }
    }
}

impl Socket for DuplexBuffer {
    type Read = io::Cursor<Vec<u8>>;
    type Write = Vec<u8>;

    fn reader(&mut self) -> &mut Self::Read {
        &mut self.input
    }

    fn writer(&mut self) -> &mut Self::Write {
        &mut self.output
    }
}
