//! RFC 2818 hostname verification (§4.3 "Hostname verification").

use std::net::IpAddr;

use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;

use super::error::TrustError;

/// Verify `hostname` (already canonicalized by [`crate::url`]) against the
/// leaf certificate's Subject Alternative Names.
pub fn verify(hostname: &str, leaf: &X509Certificate) -> Result<(), TrustError> {
    let sans = leaf
        .tbs_certificate
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|(_critical, san)| san.general_names.clone())
        .unwrap_or_default();

    if let Ok(ip) = hostname.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
        let matched = sans.iter().any(|san| matches!(san, GeneralName::IPAddress(bytes) if ip_matches(&ip, bytes)));
        return if matched { Ok(()) } else { Err(mismatch(hostname)) };
    }

    let normalized_host = normalize_dns(hostname);
    let matched = sans.iter().any(|san| match san {
        GeneralName::DNSName(pattern) => dns_pattern_matches(&normalize_dns(pattern), &normalized_host),
        _ => false,
    });

    if matched { Ok(()) } else { Err(mismatch(hostname)) }
}

fn mismatch(hostname: &str) -> TrustError {
    TrustError::HostnameMismatch { hostname: hostname.to_string() }
}

fn ip_matches(ip: &IpAddr, san_bytes: &[u8]) -> bool {
    match (ip, san_bytes.len()) {
        (IpAddr::V4(v4), 4) => v4.octets() == san_bytes,
        (IpAddr::V6(v6), 16) => v6.octets() == san_bytes,
        _ => false,
    }
}

fn normalize_dns(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    if lower.ends_with('.') { lower } else { format!("{lower}.") }
}

/// Both `pattern` and `hostname` are absolute (trailing `.`) and lowercase.
fn dns_pattern_matches(pattern: &str, hostname: &str) -> bool {
    match pattern.strip_prefix("*.") {
        None => pattern == hostname,
        Some(pattern_rest) => {
            if pattern_rest.is_empty() || !pattern_rest.contains('.') {
                // "*." alone, or a single-label pattern after the star -- reject.
                return false;
            }
            match hostname.strip_suffix(pattern_rest) {
                Some(prefix) => {
                    let label = prefix.strip_suffix('.').unwrap_or(prefix);
                    !label.is_empty() && !label.contains('.')
                }
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(dns_pattern_matches("example.com.", "example.com."));
    }

    #[test]
    fn wildcard_matches_one_label() {
        assert!(dns_pattern_matches("*.example.com.", "foo.example.com."));
        assert!(!dns_pattern_matches("*.example.com.", "example.com."));
        assert!(!dns_pattern_matches("*.example.com.", "bar.foo.example.com."));
    }

    #[test]
    fn single_label_wildcard_rejected() {
        assert!(!dns_pattern_matches("*.", "com."));
    }

    #[test]
    fn case_insensitive() {
        assert!(dns_pattern_matches(&normalize_dns("Example.COM"), &normalize_dns("example.com")));
    }
}
