use thiserror::Error;

/// Parse failures from the URL engine (§7 "Parse error": returned to the
/// caller, never retried).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported scheme {0:?} (only http/https are accepted)")]
    UnsupportedScheme(String),
    #[error("url has no scheme: {0:?}")]
    MissingScheme(String),
    #[error("url has no host: {0:?}")]
    MissingHost(String),
    #[error("invalid host: {0:?}")]
    InvalidHost(String),
    #[error("invalid port: {0:?}")]
    InvalidPort(String),
    #[error("invalid percent-encoding in {0:?}")]
    InvalidPercentEncoding(String),
    #[error("relative reference {0:?} has no base to resolve against")]
    NoBase(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PunycodeError {
    #[error("punycode input overflowed the codec's 32-bit accumulator")]
    Overflow,
    #[error("punycode label contained an invalid digit")]
    BadDigit,
    #[error("punycode label was empty after the delimiter")]
    EmptyLabel,
}
