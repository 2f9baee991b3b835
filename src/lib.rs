//! Wire-level core of an HTTP/1.1 client with WebSocket upgrade support:
//! the exchange codec, the WebSocket frame codec and session, a URL
//! engine, TLS trust glue, RFC 7234 cache strategy, and the smaller
//! header/media-type/cookie/date parsers the other modules share.
//!
//! Connection pooling, the dispatcher/interceptor chain, on-disk cache
//! storage, the builder/event-listener surface and the TLS handshake
//! itself are collaborators this crate expects to be driven by, not
//! things it implements.

pub mod cache;
pub mod cache_control;
pub mod cookie;
pub mod date;
pub mod headers;
pub mod http1;
pub mod media_type;
pub mod multipart;
pub mod socket;
pub mod tls;
pub mod url;
pub mod websocket;

pub use headers::Headers;
pub use http1::Http1Exchange;
pub use socket::Socket;
