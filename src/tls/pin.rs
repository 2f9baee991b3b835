//! Certificate pinning (§4.3 "Pin" / "Check").

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};
use x509_parser::certificate::X509Certificate;

use super::error::TrustError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pattern: String,
    hash: Vec<u8>,
}

impl Pin {
    /// Parse `"sha256/<base64 hash>"` for `pattern` (`"example.com"`,
    /// `"*.example.com"` or `"**.example.com"`).
    pub fn parse(pattern: impl Into<String>, spec: &str) -> Option<Pin> {
        let b64 = spec.strip_prefix("sha256/")?;
        let hash = BASE64.decode(b64).ok()?;
        Some(Pin { pattern: pattern.into(), hash })
    }

    pub fn new(pattern: impl Into<String>, hash: Vec<u8>) -> Pin {
        Pin { pattern: pattern.into(), hash }
    }

    fn matches_hostname(&self, hostname: &str) -> bool {
        if let Some(rest) = self.pattern.strip_prefix("**.") {
            hostname.eq_ignore_ascii_case(rest) || hostname.to_ascii_lowercase().ends_with(&format!(".{}", rest.to_ascii_lowercase()))
        } else if let Some(rest) = self.pattern.strip_prefix("*.") {
            let suffix = format!(".{}", rest.to_ascii_lowercase());
            match hostname.to_ascii_lowercase().strip_suffix(&suffix) {
                Some(label) => !label.is_empty() && !label.contains('.'),
                None => false,
            }
        } else {
            hostname.eq_ignore_ascii_case(&self.pattern)
        }
    }

    fn diagnostic(&self) -> String {
        format!("sha256/{}", BASE64.encode(&self.hash))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CertificatePinner {
    pins: Vec<Pin>,
}

impl CertificatePinner {
    pub fn new(pins: Vec<Pin>) -> CertificatePinner {
        CertificatePinner { pins }
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Check `hostname` against the (already chain-cleaned) peer chain.
    pub fn check(&self, hostname: &str, chain: &[X509Certificate]) -> Result<(), TrustError> {
        let matching: Vec<&Pin> = self.pins.iter().filter(|p| p.matches_hostname(hostname)).collect();
        if matching.is_empty() {
            return Ok(());
        }

        let peer_hashes: Vec<Vec<u8>> = chain.iter().map(spki_sha256).collect();
        for peer_hash in &peer_hashes {
            if matching.iter().any(|p| &p.hash == peer_hash) {
                return Ok(());
            }
        }

        Err(TrustError::PinningFailure {
            hostname: hostname.to_string(),
            peer_pins: peer_hashes.iter().map(|h| format!("sha256/{}", BASE64.encode(h))).collect(),
            configured_pins: matching.iter().map(|p| p.diagnostic()).collect(),
        })
    }
}

/// SHA-256 over the DER-encoded SubjectPublicKeyInfo, the quantity OkHttp's
/// `CertificatePinner` pins against (not the whole certificate).
pub fn spki_sha256(cert: &X509Certificate) -> Vec<u8> {
    let spki_der = cert.tbs_certificate.subject_pki.raw;
    Sha256::digest(spki_der).to_vec()
}
