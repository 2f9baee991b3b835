//! The exchange codec (§4.1): sequences exactly one request and one
//! response over a single [`Socket`], owning it exclusively for the
//! lifetime of the exchange.

use std::io::{BufRead, Write};

use crate::headers::Headers;
use crate::socket::Socket;

use super::body::BodyReader;
use super::error::Error;
use super::reader::{is_bodyless, read_response_head, ResponseHead, HEADER_BUDGET};
use super::trailers::Trailers;
use super::version::Version;
use super::writer::RequestWriter;

/// How far a caller has gotten with one exchange; drives which methods are
/// legal to call next (§4.1 "State machine").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    OpenRequestBody,
    WritingRequestBody,
    ReadResponseHeaders,
    OpenResponseBody,
    ReadingResponseBody,
    Closed,
}

/// The outcome of [`Http1Exchange::read_response_headers`]: either the
/// final response, a `100 Continue` (client should now send the body), or
/// some other 1xx interim response (client should call this method again).
#[derive(Debug)]
pub enum ResponseHeadResult {
    Final(ResponseHead),
    ExpectContinue,
    Interim(ResponseHead),
}

/// Bound on how many bytes [`Http1Exchange::close_body`] will discard to
/// keep the connection reusable (§4.1 "Body close" / §5 timeouts). A real
/// deployment would also bound this in time; this synchronous codec
/// bounds it in bytes instead, since it has no event loop to time out on.
pub const DISCARD_STREAM_LIMIT: u64 = 64 * 1024;

pub struct Http1Exchange<S: Socket> {
    socket: S,
    state: ExchangeState,
    writer: RequestWriter,
    header_budget: usize,
    expect_continue: bool,
    body: Option<BodyReader>,
    reusable: bool,
}

impl<S: Socket> Http1Exchange<S> {
    pub fn new(socket: S) -> Self {
        Http1Exchange {
            socket,
            state: ExchangeState::Idle,
            writer: RequestWriter::new(),
            header_budget: HEADER_BUDGET,
            expect_continue: false,
            body: None,
            reusable: true,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn set_expect_continue(&mut self, expect: bool) {
        self.expect_continue = expect;
    }

    /// `true` if the connection may be handed back to a pool once this
    /// exchange's body is closed.
    pub fn is_reusable(&self) -> bool {
        self.reusable
    }

    pub fn write_request_line(&mut self, method: &str, target: &str, version: Version) -> Result<(), Error> {
        assert_eq!(self.state, ExchangeState::Idle, "write_request_line() in state {:?}", self.state);
        self.writer.request_line(self.socket.writer(), method, target, version)?;
        self.state = ExchangeState::OpenRequestBody;
        Ok(())
    }

    pub fn add_header(&mut self, name: &str, value: &[u8]) -> Result<(), Error> {
        self.writer.add_header(self.socket.writer(), name, value).map_err(header_err)
    }

    pub fn add_length(&mut self, n: u64) -> Result<(), Error> {
        self.writer.add_length(self.socket.writer(), n).map_err(header_err)
    }

    pub fn add_chunked(&mut self) -> Result<(), Error> {
        self.writer.add_chunked(self.socket.writer()).map_err(header_err)
    }

    pub fn done_request_headers(&mut self) -> Result<(), Error> {
        self.writer.done_headers(self.socket.writer())?;
        self.state = ExchangeState::WritingRequestBody;
        Ok(())
    }

    pub fn write_request_body(&mut self, data: &[u8]) -> Result<(), Error> {
        assert_eq!(
            self.state, ExchangeState::WritingRequestBody,
            "write_request_body() in state {:?}", self.state
        );
        self.writer.write_body(self.socket.writer(), data)?;
        Ok(())
    }

    pub fn done_request_body(&mut self) -> Result<(), Error> {
        self.writer.done(self.socket.writer())?;
        self.socket.writer().flush()?;
        self.state = ExchangeState::ReadResponseHeaders;
        Ok(())
    }

    /// Read one response-header pass. Legal from `Idle`, `OpenRequestBody`,
    /// `WritingRequestBody` (to catch a `100 Continue` that races the
    /// request body) or `ReadResponseHeaders` (successive 1xx passes).
    pub fn read_response_headers(&mut self) -> Result<ResponseHeadResult, Error> {
        use ExchangeState::*;
        assert!(
            matches!(self.state, Idle | OpenRequestBody | WritingRequestBody | ReadResponseHeaders),
            "read_response_headers() in state {:?}", self.state
        );
        self.state = ReadResponseHeaders;
        let head = read_response_head(self.socket.reader(), &mut self.header_budget)?;
        if head.code == 100 && self.expect_continue {
            return Ok(ResponseHeadResult::ExpectContinue);
        }
        if (100..200).contains(&head.code) {
            return Ok(ResponseHeadResult::Interim(head));
        }
        self.state = OpenResponseBody;
        Ok(ResponseHeadResult::Final(head))
    }

    /// Choose and install the response body framer per §4.1's four rules,
    /// given the final response head and whether this was a HEAD request.
    pub fn open_response_body(&mut self, head: &ResponseHead, is_head_request: bool) -> Result<(), Error> {
        assert_eq!(self.state, ExchangeState::OpenResponseBody, "open_response_body() in state {:?}", self.state);
        let reader = if is_bodyless(is_head_request, head.code) {
            BodyReader::fixed(0)
        } else if head.headers.get_all("Transfer-Encoding").any(|v| crate::headers::is_chunked(v.as_bytes())) {
            BodyReader::chunked()
        } else if let Some(len) = head.headers.get("Content-Length") {
            let len: u64 = len.parse().map_err(|_| Error::BadHeaderLine(format!("Content-Length: {len}")))?;
            BodyReader::fixed(len)
        } else {
            self.reusable = false;
            BodyReader::unknown_length()
        };
        self.body = Some(reader);
        self.state = ExchangeState::ReadingResponseBody;
        Ok(())
    }

    pub fn read_response_body(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        assert_eq!(
            self.state, ExchangeState::ReadingResponseBody,
            "read_response_body() in state {:?}", self.state
        );
        let body = self.body.as_mut().expect("open_response_body() was not called");
        let n = body.read(self.socket.reader(), buf)?;
        if n == 0 && body.is_done() {
            self.state = ExchangeState::Closed;
        }
        Ok(n)
    }

    /// `peek_trailers()`: legal only from `ReadingResponseBody` or `Closed`.
    pub fn peek_trailers(&self) -> Result<Option<&Headers>, super::trailers::TruncatedBodyError> {
        assert!(
            matches!(self.state, ExchangeState::ReadingResponseBody | ExchangeState::Closed),
            "peek_trailers() in state {:?}", self.state
        );
        self.body.as_ref().expect("open_response_body() was not called").trailers().peek()
    }

    /// Close the body before it is exhausted, draining a bounded amount so
    /// the connection can be reused (§4.1 "Body close").
    pub fn close_body(&mut self) -> Result<(), Error> {
        if self.state == ExchangeState::Closed {
            return Ok(());
        }
        let mut discarded = 0u64;
        let mut buf = [0u8; 4096];
        loop {
            if discarded >= DISCARD_STREAM_LIMIT {
                self.reusable = false;
                if let Some(body) = &mut self.body {
                    *body = BodyReader::fixed(0);
                    if let BodyReader::Fixed { trailers, .. } = body {
                        *trailers = Trailers::Truncated;
                    }
                }
                break;
            }
            match self.read_response_body(&mut buf) {
                Ok(0) => break,
                Ok(n) => discarded += n as u64,
                Err(_) => {
                    self.reusable = false;
                    break;
                }
            }
        }
        self.state = ExchangeState::Closed;
        Ok(())
    }

    /// Cancel the exchange: closes the transport; subsequent reads/writes
    /// fail with [`Error::Cancelled`] from the caller's perspective since
    /// the underlying socket is gone.
    pub fn cancel(&mut self) {
        let _ = self.socket.close();
        self.state = ExchangeState::Closed;
        self.reusable = false;
    }
}

fn header_err(e: super::writer::HeaderError) -> Error {
    use super::writer::HeaderError as H;
    match e {
        H::Io(io) => Error::Io(io),
        other => Error::BadHeaderLine(other.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::socket::DuplexBuffer;

    fn exchange_with(response: &str) -> Http1Exchange<DuplexBuffer> {
        Http1Exchange::new(DuplexBuffer::new(response.as_bytes().to_vec()))
    }

    #[test]
    fn fixed_length_response_end_to_end() {
        let mut ex = exchange_with("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
        ex.write_request_line("GET", "/", Version::Http11).unwrap();
        ex.add_length(0).unwrap();
        ex.done_request_headers().unwrap();
        ex.done_request_body().unwrap();

        let head = match ex.read_response_headers().unwrap() {
            ResponseHeadResult::Final(h) => h,
            other => panic!("expected final response, got {other:?}"),
        };
        assert_eq!(head.headers.get("Content-Length"), Some("5"));
        ex.open_response_body(&head, false).unwrap();

        let mut out = Vec::new();
        let mut buf = [0u8; 2];
        loop {
            let n = ex.read_response_body(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"hello");
        assert_eq!(ex.state(), ExchangeState::Closed);
        assert!(ex.peek_trailers().unwrap().unwrap().is_empty());
    }

    #[test]
    fn chunked_response_with_trailers() {
        let mut ex = exchange_with(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
             5\r\nhello\r\n6\r\n world\r\n0\r\nX-Extra: yes\r\n\r\n",
        );
        ex.write_request_line("GET", "/", Version::Http11).unwrap();
        ex.add_length(0).unwrap();
        ex.done_request_headers().unwrap();
        ex.done_request_body().unwrap();
        let head = match ex.read_response_headers().unwrap() {
            ResponseHeadResult::Final(h) => h,
            other => panic!("expected final response, got {other:?}"),
        };
        ex.open_response_body(&head, false).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = ex.read_response_body(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"hello world");
        let trailers = ex.peek_trailers().unwrap().unwrap();
        assert_eq!(trailers.get("X-Extra"), Some("yes"));
    }

    #[test]
    fn hundred_continue_then_final() {
        let mut ex = exchange_with("HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        ex.set_expect_continue(true);
        ex.write_request_line("POST", "/", Version::Http11).unwrap();
        ex.add_length(0).unwrap();
        ex.done_request_headers().unwrap();
        match ex.read_response_headers().unwrap() {
            ResponseHeadResult::ExpectContinue => {}
            other => panic!("expected ExpectContinue, got {other:?}"),
        }
        ex.done_request_body().unwrap();
        match ex.read_response_headers().unwrap() {
            ResponseHeadResult::Final(h) => assert_eq!(h.code, 200),
            other => panic!("expected final, got {other:?}"),
        }
    }

    #[test]
    fn unknown_length_marks_non_reusable() {
        let mut ex = exchange_with("HTTP/1.1 200 OK\r\n\r\nabc");
        ex.write_request_line("GET", "/", Version::Http11).unwrap();
        ex.add_length(0).unwrap();
        ex.done_request_headers().unwrap();
        ex.done_request_body().unwrap();
        let head = match ex.read_response_headers().unwrap() {
            ResponseHeadResult::Final(h) => h,
            other => panic!("{other:?}"),
        };
        ex.open_response_body(&head, false).unwrap();
        assert!(!ex.is_reusable());
    }
}
