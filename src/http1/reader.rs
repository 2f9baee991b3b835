//! Status line and header-block reading, with the 256 KiB status+headers
//! budget from §4.1.

use std::io::BufRead;

use crate::headers::Headers;
use crate::socket::BufReadExt;

use super::error::Error;
use super::version::Version;

/// Combined status-line + header budget, per §4.1 ("Reading headers").
pub const HEADER_BUDGET: usize = 256 * 1024;

#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    pub headers: Headers,
}

/// Reads one `HTTP/<major>.<minor> SP code SP [message] CRLF` status line
/// plus the following header block, terminated by a bare CRLF.
///
/// `budget` is decremented as bytes are consumed; a line that would exceed
/// the remaining budget fails the read, matching the single 256 KiB budget
/// shared by the status line and all header lines.
pub fn read_response_head<R: BufRead>(source: &mut R, budget: &mut usize) -> Result<ResponseHead, Error> {
    let line = read_budgeted_line(source, budget, "status line")?;
    let (version, code, reason) = parse_status_line(&line)?;

    let mut headers = Headers::new();
    loop {
        let line = read_budgeted_line(source, budget, "header line")?;
        if line.is_empty() {
            break;
        }
        headers.parse_line(&line)?;
    }
    Ok(ResponseHead { version, code, reason, headers })
}

fn read_budgeted_line<R: BufRead>(source: &mut R, budget: &mut usize, what: &'static str) -> Result<String, Error> {
    if *budget == 0 {
        return Err(Error::HeaderBudgetExceeded { limit: HEADER_BUDGET });
    }
    let line = source.read_line_bounded(*budget).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::EndOfStream { context: what, redacted_url: String::new() }
        } else if e.kind() == std::io::ErrorKind::InvalidData && e.to_string().contains("budget") {
            Error::HeaderBudgetExceeded { limit: HEADER_BUDGET }
        } else {
            Error::Io(e)
        }
    })?;
    *budget = budget.saturating_sub(line.len() + 2);
    Ok(line)
}

fn parse_status_line(line: &str) -> Result<(Version, u16, String), Error> {
    let mut parts = line.splitn(3, ' ');
    let version_str = parts.next().ok_or_else(|| Error::BadStatusLine(line.to_string()))?;
    let version: Version = version_str.parse().map_err(|_| Error::BadStatusLine(line.to_string()))?;
    let code_str = parts.next().ok_or_else(|| Error::BadStatusLine(line.to_string()))?;
    if code_str.len() != 3 || !code_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::BadStatusLine(line.to_string()));
    }
    let code: u16 = code_str.parse().map_err(|_| Error::BadStatusLine(line.to_string()))?;
    let reason = parts.next().unwrap_or("").to_string();
    Ok((version, code, reason))
}

/// Does this status promise no body, per §4.1 rule (1)?
pub fn is_bodyless(is_head_request: bool, code: u16) -> bool {
    is_head_request || (100..200).contains(&code) || code == 204 || code == 304
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn status_line_without_reason() {
        let mut src = Cursor::new(b"HTTP/1.1 200\r\n\r\n".to_vec());
        let mut budget = HEADER_BUDGET;
        let head = read_response_head(&mut src, &mut budget).unwrap();
        assert_eq!(head.code, 200);
        assert_eq!(head.reason, "");
    }

    #[test]
    fn fixed_length_response_headers() {
        let mut src = Cursor::new(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello".to_vec());
        let mut budget = HEADER_BUDGET;
        let head = read_response_head(&mut src, &mut budget).unwrap();
        assert_eq!(head.version, Version::Http11);
        assert_eq!(head.code, 200);
        assert_eq!(head.reason, "OK");
        assert_eq!(head.headers.get("Content-Length"), Some("5"));
    }

    #[test]
    fn budget_exceeded() {
        let huge = "x".repeat(HEADER_BUDGET + 1);
        let mut src = Cursor::new(format!("{huge}\r\n\r\n").into_bytes());
        let mut budget = HEADER_BUDGET;
        let err = read_response_head(&mut src, &mut budget).unwrap_err();
        assert!(matches!(err, Error::HeaderBudgetExceeded { .. }));
    }
}
