//! The `Sec-WebSocket-Key`/`Accept` handshake math and permessage-deflate
//! extension negotiation (§4.6.1). Replaces the teacher's hand-rolled
//! base64 alphabet table (`keys.rs`) with the `base64` crate, now that it
//! is part of this ecosystem's dependency graph.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::{thread_rng, RngCore};
use sha1::{Digest, Sha1};

use super::error::Error;

const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// A fresh, random `Sec-WebSocket-Key` value for a client handshake.
pub fn client_key() -> String {
    let mut key = [0u8; 16];
    thread_rng().fill_bytes(&mut key);
    STANDARD.encode(key)
}

/// Compute the `Sec-WebSocket-Accept` value for a `Sec-WebSocket-Key`.
pub fn accept_value(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Verify a server's `Sec-WebSocket-Accept` response against the key this
/// side sent.
pub fn verify_accept(key: &str, accept: &str) -> Result<(), Error> {
    if accept_value(key) == accept {
        Ok(())
    } else {
        Err(Error::BadAccept)
    }
}

/// Negotiated permessage-deflate parameters (§4.6.1, §6).
#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateParams {
    pub client_no_context_takeover: bool,
    pub server_no_context_takeover: bool,
}

/// Parse the `Sec-WebSocket-Extensions` response value for a
/// `permessage-deflate` offer, rejecting unknown parameters or any
/// `client_max_window_bits`/`server_max_window_bits` other than 15 (only
/// the full window is accepted).
pub fn negotiate_deflate(extensions_header: Option<&str>) -> Result<Option<DeflateParams>, Error> {
    let Some(header) = extensions_header else {
        return Ok(None);
    };

    for offer in header.split(',') {
        let mut parts = offer.split(';').map(str::trim);
        let Some(name) = parts.next() else { continue };
        if !name.eq_ignore_ascii_case("permessage-deflate") {
            continue;
        }

        let mut params = DeflateParams::default();
        for param in parts {
            let (key, value) = param.split_once('=').map(|(k, v)| (k.trim(), Some(v.trim()))).unwrap_or((param, None));
            match key.to_ascii_lowercase().as_str() {
                "client_no_context_takeover" => params.client_no_context_takeover = true,
                "server_no_context_takeover" => params.server_no_context_takeover = true,
                "client_max_window_bits" => {
                    if let Some(v) = value {
                        if v != "15" {
                            return Err(Error::ExtensionNegotiationFailed("client_max_window_bits must be 15"));
                        }
                    }
                }
                "server_max_window_bits" => {
                    if value != Some("15") {
                        return Err(Error::ExtensionNegotiationFailed("server_max_window_bits must be 15"));
                    }
                }
                _ => return Err(Error::ExtensionNegotiationFailed("unknown permessage-deflate parameter")),
            }
        }
        return Ok(Some(params));
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accept_matches_rfc_6455_example() {
        assert_eq!(accept_value("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn verify_accepts_the_right_value() {
        let key = client_key();
        let accept = accept_value(&key);
        assert!(verify_accept(&key, &accept).is_ok());
        assert!(verify_accept(&key, "not-it").is_err());
    }

    #[test]
    fn negotiates_plain_permessage_deflate() {
        let params = negotiate_deflate(Some("permessage-deflate")).unwrap();
        assert!(params.is_some());
    }

    #[test]
    fn accepts_context_takeover_flags() {
        let params = negotiate_deflate(Some("permessage-deflate; client_no_context_takeover")).unwrap().unwrap();
        assert!(params.client_no_context_takeover);
        assert!(!params.server_no_context_takeover);
    }

    #[test]
    fn rejects_non_default_window_bits() {
        assert!(negotiate_deflate(Some("permessage-deflate; client_max_window_bits=10")).is_err());
    }

    #[test]
    fn rejects_unknown_parameter() {
        assert!(negotiate_deflate(Some("permessage-deflate; bogus_param")).is_err());
    }

    #[test]
    fn no_extensions_header_means_no_deflate() {
        assert!(negotiate_deflate(None).unwrap().is_none());
    }
}
