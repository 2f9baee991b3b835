//! Combining a `304 Not Modified` network response with the stored response
//! it validated (§4.4 "Combining headers").

use crate::headers::Headers;

/// Hop-by-hop and connection-scoped headers that never survive a combine,
/// regardless of which side they came from.
const HOP_BY_HOP: &[&str] =
    &["Connection", "Keep-Alive", "Proxy-Authenticate", "Proxy-Authorization", "TE", "Trailers", "Transfer-Encoding", "Upgrade"];

/// Fields the stored response always wins on, since the 304 doesn't
/// re-describe a body it isn't sending.
const STORED_WINS: &[&str] = &["Content-Length", "Content-Encoding", "Content-Type"];

/// Build the combined header set for a validated (304) exchange: start from
/// the stored headers, drop hop-by-hop and `Warning: 1xx` entries, then let
/// the network response's headers override everywhere except the fields
/// that describe the (unsent) body.
///
/// The `Warning` check matches entries whose value starts with the literal
/// byte `'1'`, not a parsed three-digit warn-code -- this mirrors the
/// historical behavior being preserved here rather than a stricter reading
/// of RFC 7234 §5.5.
pub fn combine(stored: &Headers, network: &Headers) -> Headers {
    let mut combined = Headers::new();

    for (name, value) in stored.iter() {
        if is_hop_by_hop(name) {
            continue;
        }
        if name.eq_ignore_ascii_case("Warning") && value.starts_with('1') {
            continue;
        }
        combined.add(name.to_string(), value.to_string());
    }

    for (name, value) in network.iter() {
        if is_hop_by_hop(name) {
            continue;
        }
        if STORED_WINS.iter().any(|field| field.eq_ignore_ascii_case(name)) && stored.contains(name) {
            continue;
        }
        combined.remove(name);
        combined.add(name.to_string(), value.to_string());
    }

    combined
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stored_content_headers_win() {
        let mut stored = Headers::new();
        stored.add("Content-Type", "text/html").add("Content-Length", "42").add("ETag", "\"v1\"");
        let mut network = Headers::new();
        network.add("Content-Type", "text/plain").add("Date", "Tue, 15 Nov 1994 08:12:31 GMT");

        let combined = combine(&stored, &network);
        assert_eq!(combined.get("Content-Type"), Some("text/html"));
        assert_eq!(combined.get("Content-Length"), Some("42"));
        assert_eq!(combined.get("Date"), Some("Tue, 15 Nov 1994 08:12:31 GMT"));
        assert_eq!(combined.get("ETag"), Some("\"v1\""));
    }

    #[test]
    fn network_overrides_non_body_fields() {
        let mut stored = Headers::new();
        stored.add("ETag", "\"v1\"").add("Cache-Control", "max-age=100");
        let mut network = Headers::new();
        network.add("Cache-Control", "max-age=200").add("ETag", "\"v1\"");

        let combined = combine(&stored, &network);
        assert_eq!(combined.get("Cache-Control"), Some("max-age=200"));
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut stored = Headers::new();
        stored.add("Connection", "keep-alive").add("ETag", "\"v1\"");
        let mut network = Headers::new();
        network.add("Transfer-Encoding", "chunked");

        let combined = combine(&stored, &network);
        assert!(!combined.contains("Connection"));
        assert!(!combined.contains("Transfer-Encoding"));
        assert_eq!(combined.get("ETag"), Some("\"v1\""));
    }

    #[test]
    fn warning_1xx_dropped_by_literal_prefix() {
        let mut stored = Headers::new();
        stored.add("Warning", "112 - \"cache down\"").add("Warning", "299 - \"misc\"");
        let network = Headers::new();

        let combined = combine(&stored, &network);
        assert_eq!(combined.get_all("Warning").collect::<Vec<_>>(), vec!["299 - \"misc\""]);
    }
}
