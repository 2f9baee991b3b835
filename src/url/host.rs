//! Host canonicalization (§4.2 "Host canonicalization"): IPv4/IPv6 literals
//! down to their canonical textual form, IDN hostnames through [`super::idna`].

use std::net::{Ipv4Addr, Ipv6Addr};

use super::error::ParseError;
use super::idna;

const INVALID_HOST_CHARS: &[char] = &[' ', '#', '%', '/', ':', '?', '@', '[', ']', '\\'];

/// Canonicalize a host (already stripped of any `[...]` brackets) into its
/// wire form: a lowercase ASCII hostname, a canonical IPv4 dotted-quad, or a
/// canonical (RFC 5952-compressed) IPv6 literal.
pub fn canonicalize(host: &str) -> Result<String, ParseError> {
    if host.is_empty() {
        return Err(ParseError::MissingHost(host.to_string()));
    }

    if let Some(inner) = host.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return canonicalize_ipv6(inner);
    }
    if host.contains(':') {
        // Bare (unbracketed) IPv6 is not valid URL syntax, but an
        // IPv4-mapped form like "::ffff:1.2.3.4" can still appear bracketed;
        // an unbracketed colon here is always an error.
        return canonicalize_ipv6(host);
    }
    if let Ok(v4) = host.parse::<Ipv4Addr>() {
        return Ok(v4.to_string());
    }

    if host.chars().any(|c| INVALID_HOST_CHARS.contains(&c)) {
        return Err(ParseError::InvalidHost(host.to_string()));
    }

    let ascii = idna::to_ascii(host)?;
    if ascii.is_empty() || ascii.len() > 253 {
        return Err(ParseError::InvalidHost(host.to_string()));
    }
    Ok(ascii)
}

fn canonicalize_ipv6(inner: &str) -> Result<String, ParseError> {
    let addr: Ipv6Addr = inner.parse().map_err(|_| ParseError::InvalidHost(inner.to_string()))?;
    if let Some(v4) = addr.to_ipv4_mapped() {
        return Ok(v4.to_string());
    }
    Ok(format!("[{addr}]"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lowercases_ascii_hostnames() {
        assert_eq!(canonicalize("WwW.Example.CoM").unwrap(), "www.example.com");
    }

    #[test]
    fn canonicalizes_ipv4() {
        assert_eq!(canonicalize("127.0.0.1").unwrap(), "127.0.0.1");
    }

    #[test]
    fn compresses_ipv6() {
        assert_eq!(canonicalize("[2001:0db8:0000:0000:0000:0000:0000:0001]").unwrap(), "[2001:db8::1]");
    }

    #[test]
    fn folds_ipv4_mapped_ipv6_down_to_ipv4() {
        assert_eq!(canonicalize("[::ffff:192.0.2.128]").unwrap(), "192.0.2.128");
    }

    #[test]
    fn rejects_invalid_host_characters() {
        assert!(canonicalize("exa mple.com").is_err());
    }
}
