//! `ConnectionSpec`: cipher-suite and TLS-version presets (§4.8).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlsVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl TlsVersion {
    fn as_str(self) -> &'static str {
        match self {
            TlsVersion::Tls10 => "TLSv1",
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `TLS_FALLBACK_SCSV` pseudo cipher, appended when a spec is applied
/// as a protocol-downgrade fallback attempt.
pub const TLS_FALLBACK_SCSV: &str = "TLS_FALLBACK_SCSV";

#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    tls: bool,
    cipher_suites: Vec<String>,
    tls_versions: Vec<TlsVersion>,
    supports_tls_extensions: bool,
}

impl ConnectionSpec {
    pub fn cleartext() -> ConnectionSpec {
        ConnectionSpec { tls: false, cipher_suites: Vec::new(), tls_versions: Vec::new(), supports_tls_extensions: false }
    }

    pub fn modern() -> ConnectionSpec {
        ConnectionSpec {
            tls: true,
            cipher_suites: vec![
                "TLS_AES_128_GCM_SHA256".into(),
                "TLS_AES_256_GCM_SHA384".into(),
                "TLS_CHACHA20_POLY1305_SHA256".into(),
                "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256".into(),
                "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256".into(),
                "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256".into(),
            ],
            tls_versions: vec![TlsVersion::Tls13, TlsVersion::Tls12],
            supports_tls_extensions: true,
        }
    }

    pub fn compatible() -> ConnectionSpec {
        let mut spec = ConnectionSpec::modern();
        spec.cipher_suites.push("TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA".into());
        spec.tls_versions.push(TlsVersion::Tls11);
        spec.tls_versions.push(TlsVersion::Tls10);
        spec
    }

    pub fn legacy() -> ConnectionSpec {
        ConnectionSpec {
            tls: true,
            cipher_suites: vec!["SSL_RSA_WITH_3DES_EDE_CBC_SHA".into(), "TLS_RSA_WITH_AES_128_CBC_SHA".into()],
            tls_versions: vec![TlsVersion::Tls10],
            supports_tls_extensions: false,
        }
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    pub fn tls_versions(&self) -> &[TlsVersion] {
        &self.tls_versions
    }

    /// Intersect this spec's cipher suites with the platform-supported
    /// list (comparing names while ignoring the `TLS_`/`SSL_` prefix),
    /// ordered by this spec's preference, optionally appending the
    /// fallback SCSV marker.
    pub fn apply(&self, platform_supported: &[String], is_fallback: bool) -> Vec<String> {
        let mut result: Vec<String> = self
            .cipher_suites
            .iter()
            .filter(|wanted| platform_supported.iter().any(|have| suite_names_match(wanted, have)))
            .cloned()
            .collect();
        if is_fallback && !result.contains(&TLS_FALLBACK_SCSV.to_string()) {
            result.push(TLS_FALLBACK_SCSV.to_string());
        }
        result
    }
}

fn strip_prefix_family(name: &str) -> &str {
    name.strip_prefix("TLS_").or_else(|| name.strip_prefix("SSL_")).unwrap_or(name)
}

fn suite_names_match(a: &str, b: &str) -> bool {
    strip_prefix_family(a).eq_ignore_ascii_case(strip_prefix_family(b))
}
