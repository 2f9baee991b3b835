//! WebSocket errors (§4.6), generalized from the teacher's single flat
//! `ErrorEnum` into causes that actually arise once fragmentation,
//! permessage-deflate and close-code validation are implemented.

use std::str::Utf8Error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("text frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
    #[error("frame has an invalid opcode: {0}")]
    InvalidOpcode(u8),
    #[error("received a frame masked the wrong way for this side of the connection")]
    WrongMaskDirection,
    #[error("a reserved bit was set without permessage-deflate negotiated")]
    ReservedBitSet,
    #[error("control frame exceeds the 125-byte payload limit")]
    ControlFrameTooLarge,
    #[error("control frame must not be fragmented")]
    ControlFrameFragmented,
    #[error("continuation frame received with no message in progress")]
    UnexpectedContinuation,
    #[error("new message started before the previous fragmented message finished")]
    ExpectedContinuation,
    #[error("frame payload of {0} bytes exceeds the configured limit")]
    TooLong(usize),
    #[error("close frame carries invalid status code {0}")]
    InvalidCloseCode(u16),
    #[error("close frame has a 1-byte payload, which is not a valid status code")]
    TruncatedCloseCode,
    #[error("permessage-deflate negotiation failed: {0}")]
    ExtensionNegotiationFailed(&'static str),
    #[error("outgoing message queue exceeded its byte budget")]
    QueueOverflow,
    #[error("no pong received before the next ping interval")]
    PingTimeout,
    #[error("the session is already closed")]
    Closed,
    #[error("Sec-WebSocket-Accept did not match the computed value")]
    BadAccept,
}
