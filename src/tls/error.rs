use thiserror::Error;

/// Trust errors (§7 "Trust error"): terminal, never retried.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("certificate pinning failed for {hostname}: peer sent {peer_pins:?}, configured pins are {configured_pins:?}")]
    PinningFailure { hostname: String, peer_pins: Vec<String>, configured_pins: Vec<String> },

    #[error("no trusted root reachable within {max_iterations} chain-cleaning iterations")]
    ChainCleaningFailed { max_iterations: usize },

    #[error("hostname {hostname:?} does not match certificate")]
    HostnameMismatch { hostname: String },

    #[error("unsupported signature algorithm during chain verification")]
    UnsupportedSignatureAlgorithm,

    #[error(transparent)]
    CertificateParse(#[from] x509_parser::error::X509Error),
}
