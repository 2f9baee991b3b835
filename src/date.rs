//! HTTP-date parsing (§3 "Date parser"): RFC 1123 plus the RFC 850 and
//! asctime fallbacks RFC 7231 §7.1.1.1 requires recipients to accept.

use std::time::SystemTime;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed HTTP date: {0:?}")]
pub struct DateError(String);

/// Parse a `Date`/`Expires`/`Last-Modified`/`If-Modified-Since` header
/// value. Accepts IMF-fixdate (`httpdate`'s native format) and, via the
/// same parser, the legacy RFC 850 and asctime forms.
pub fn parse(value: &str) -> Result<SystemTime, DateError> {
    httpdate::parse_http_date(value.trim()).map_err(|_| DateError(value.to_string()))
}

/// Format a timestamp as an IMF-fixdate `Date` header value.
pub fn format(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_imf_fixdate() {
        let t = parse("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(format(t), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn parses_rfc850_fallback() {
        assert!(parse("Sunday, 06-Nov-94 08:49:37 GMT").is_ok());
    }

    #[test]
    fn parses_asctime_fallback() {
        assert!(parse("Sun Nov  6 08:49:37 1994").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("not a date").is_err());
    }

    #[test]
    fn format_round_trips_through_parse() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let formatted = format(t);
        assert_eq!(parse(&formatted).unwrap(), t);
    }
}
