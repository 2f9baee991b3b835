use thiserror::Error;

/// Errors raised by the HTTP/1.1 exchange codec (§7).
///
/// `Protocol` and `EndOfStream` are kept as distinct variants (rather than
/// collapsing EOF into a generic protocol violation) purely for
/// diagnostics, per §7: the codec's handling of the two is identical
/// (non-recoverable, transport marked non-reusable).
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed status line: {0:?}")]
    BadStatusLine(String),

    #[error("header block exceeded the {limit} byte budget")]
    HeaderBudgetExceeded { limit: usize },

    #[error("malformed header line: {0:?}")]
    BadHeaderLine(String),

    #[error(transparent)]
    Header(#[from] crate::headers::HeaderError),

    #[error("malformed chunk size line: {0:?}")]
    BadChunkSize(String),

    #[error("premature end of stream while reading {context} (url: {redacted_url})")]
    EndOfStream { context: &'static str, redacted_url: String },

    #[error("exchange cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// `true` for the kinds that mean "the transport can never be reused".
    pub fn is_fatal_to_connection(&self) -> bool {
        !matches!(self, Error::Cancelled)
    }
}
