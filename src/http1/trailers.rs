use crate::headers::Headers;

/// Trailers left behind by a body reader once it reaches a terminal state.
///
/// The teacher implementation uses a singleton `Headers` value compared by
/// reference identity as a "truncated" sentinel (§9 design note); this is
/// the explicit three-valued enum the design notes recommend instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Trailers {
    /// The body has not finished yet.
    #[default]
    None,
    /// The body finished normally; these are the (possibly empty) trailers.
    Headers(Headers),
    /// The body ended before it should have (premature EOF, close-before-drain).
    Truncated,
}

impl Trailers {
    pub fn is_truncated(&self) -> bool {
        matches!(self, Trailers::Truncated)
    }

    /// `peek_trailers()`: fails if the body ended in truncation.
    pub fn peek(&self) -> Result<Option<&Headers>, TruncatedBodyError> {
        match self {
            Trailers::None => Ok(None),
            Trailers::Headers(h) => Ok(Some(h)),
            Trailers::Truncated => Err(TruncatedBodyError),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("response body ended before it was fully read; trailers unavailable")]
pub struct TruncatedBodyError;
