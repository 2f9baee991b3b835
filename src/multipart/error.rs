use crate::headers::HeaderError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("response Content-Type is missing a boundary parameter")]
    MissingBoundary,
    #[error("malformed multipart delimiter line: {0:?}")]
    BadDelimiterLine(String),
    #[error("read past the current part's boundary")]
    ReadPastBoundary,
    #[error("part header line: {0}")]
    Header(#[from] HeaderError),
    #[error("multipart stream ended before the closing delimiter")]
    UnexpectedEof,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
