//! HTTP/1.1 wire codec: request writer, response reader, body framers and
//! the exchange state machine that sequences them over a single
//! [`crate::socket::Socket`] (§4.1 in its entirety).

mod body;
mod error;
mod exchange;
mod reader;
mod trailers;
mod version;
mod writer;

pub use body::BodyReader;
pub use error::Error;
pub use exchange::{DISCARD_STREAM_LIMIT, ExchangeState, Http1Exchange, ResponseHeadResult};
pub use reader::{HEADER_BUDGET, ResponseHead, is_bodyless, read_response_head};
pub use trailers::{Trailers, TruncatedBodyError};
pub use version::Version;
pub use writer::{HeaderError, RequestWriter};
