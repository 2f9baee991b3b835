//! TLS trust glue (§4.3, §4.8): certificate pinning, chain cleaning and
//! RFC 2818 hostname verification, plus `ConnectionSpec` cipher/version
//! presets. The TLS handshake itself is an out-of-scope collaborator (§1);
//! this module only judges the peer chain it hands back.

mod chain;
mod connection_spec;
mod error;
mod hostname;
mod pin;

pub use chain::clean as clean_chain;
pub use connection_spec::{ConnectionSpec, TLS_FALLBACK_SCSV, TlsVersion};
pub use error::TrustError;
pub use hostname::verify as verify_hostname;
pub use pin::{CertificatePinner, Pin, spki_sha256};
