//! WebSocket frame codec and session (§4.6): RFC 6455 framing plus RFC
//! 7692 permessage-deflate, driven synchronously over a [`Socket`]
//! (§5 "WebSocket session"). The connection upgrade handshake's HTTP side
//! reuses [`crate::http1`]; this module owns only what happens after it.

mod close_codes;
mod config;
mod deflate;
mod error;
mod frame;
mod handshake;
mod session;

pub use config::{Config, MAX_QUEUE_SIZE};
pub use error::Error;
pub use handshake::{accept_value, client_key, negotiate_deflate, verify_accept, DeflateParams};
pub use session::{Event, Message, RealWebSocket};
