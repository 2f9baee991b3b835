//! An ordered, case-insensitive multimap of header name/value pairs, plus
//! the handful of header-value predicates the exchange codec needs
//! (`Connection: close`, `Transfer-Encoding: chunked`, `Expect: 100-continue`).

use std::fmt;

/// A single (name, value) pair as it will appear on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    name: String,
    value: String,
}

/// Ordered, case-insensitive multimap of header fields.
///
/// Duplicate names are allowed and preserve the order they were added in,
/// matching RFC 7230's "order in which header fields with the same name
/// are received is significant" rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers {
    entries: Vec<Entry>,
}

/// Error returned by the lenient line-oriented header builder.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header line has no ':' separator: {0:?}")]
    MissingColon(String),
    #[error("header name contains invalid characters")]
    InvalidName,
    #[error("header value contains invalid characters")]
    InvalidValue,
}

impl Headers {
    pub fn new() -> Headers {
        Headers { entries: Vec::new() }
    }

    /// Append a header, keeping any existing entries with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.push(Entry { name: name.into(), value: value.into() });
        self
    }

    /// Replace all entries for `name` with a single new value.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> &mut Self {
        self.remove(name.as_ref());
        self.add(name.as_ref().to_string(), value);
        self
    }

    /// Remove all entries matching `name` (case-insensitive).
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.entries.retain(|e| !e.name.eq_ignore_ascii_case(name));
        self
    }

    /// First value for `name`, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.value.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries.iter()
            .filter(move |e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.name.as_str(), e.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a single `name: value` (or lenient `name:value`, or leading
    /// `:pseudo-header`) line as accepted by the lenient builder.
    pub fn parse_line(&mut self, line: &str) -> Result<(), HeaderError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(rest) = line.strip_prefix(':') {
            // HTTP/2-style pseudo header smuggled through a line-oriented
            // builder: keep the leading colon as part of the name.
            let (name, value) = split_colon(rest)
                .ok_or_else(|| HeaderError::MissingColon(line.to_string()))?;
            let name = format!(":{name}");
            self.push_validated(name, value)?;
            return Ok(());
        }
        let (name, value) = split_colon(line)
            .ok_or_else(|| HeaderError::MissingColon(line.to_string()))?;
        self.push_validated(name.to_string(), value)
    }

    fn push_validated(&mut self, name: String, value: &str) -> Result<(), HeaderError> {
        if name.is_empty() || name.bytes().any(|b| invalid_name_byte(b)) {
            return Err(HeaderError::InvalidName);
        }
        let value = value.trim();
        if invalid_header(value.as_bytes()) {
            return Err(HeaderError::InvalidValue);
        }
        self.add(name, value.to_string());
        Ok(())
    }
}

fn split_colon(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(':')?;
    Some((&line[..idx], &line[idx + 1..]))
}

fn invalid_name_byte(b: u8) -> bool {
    matches!(b, b'\r' | b'\n' | b' ' | b'\t' | b':')
}

fn invalid_header(value: &[u8]) -> bool {
    value.iter().any(|&x| x == b'\r' || x == b'\n')
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// `true` if a `Connection` header value is (lenient, case-insensitive) `close`.
pub fn is_close(val: &[u8]) -> bool {
    token_equals(val, b"close")
}

/// `true` if a `Transfer-Encoding` token is (lenient, case-insensitive) `chunked`.
pub fn is_chunked(val: &[u8]) -> bool {
    token_equals(val, b"chunked")
}

/// `true` if an `Expect` header value is (lenient, case-insensitive) `100-continue`.
pub fn is_continue(val: &[u8]) -> bool {
    token_equals(val, b"100-continue")
}

/// Compares a header value to `token` ignoring ASCII case and surrounding
/// HTTP whitespace (`\r\n \t`).
fn token_equals(val: &[u8], token: &[u8]) -> bool {
    let trimmed: Vec<u8> = val.iter().copied()
        .skip_while(|&b| matches!(b, b'\r' | b'\n' | b' ' | b'\t'))
        .collect();
    if trimmed.len() < token.len() {
        return false;
    }
    if !trimmed[..token.len()].eq_ignore_ascii_case(token) {
        return false;
    }
    trimmed[token.len()..].iter().all(|&b| matches!(b, b'\r' | b'\n' | b' ' | b'\t'))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chunked() {
        assert!(is_chunked(b"chunked"));
        assert!(is_chunked(b"Chunked"));
        assert!(is_chunked(b"chuNKED"));
        assert!(is_chunked(b"CHUNKED"));
        assert!(is_chunked(b"   CHUNKED"));
        assert!(is_chunked(b"   CHUNKED  "));
        assert!(is_chunked(b"chunked  "));
        assert!(!is_chunked(b"   CHUNKED 1 "));
    }

    #[test]
    fn test_close() {
        assert!(is_close(b"close"));
        assert!(is_close(b"Close"));
        assert!(is_close(b"clOSE"));
        assert!(is_close(b" CLOSE"));
        assert!(is_close(b"   close   "));
        assert!(!is_close(b"Close  1 "));
        assert!(!is_close(b" xclose   "));
    }

    #[test]
    fn test_continue() {
        assert!(is_continue(b"100-continue"));
        assert!(is_continue(b"100-Continue"));
        assert!(is_continue(b"  100-CONTINUE"));
        assert!(!is_continue(b"100-continue y  "));
        assert!(!is_continue(b"100-coztinue   "));
    }

    #[test]
    fn ordered_duplicates_preserved() {
        let mut h = Headers::new();
        h.add("X-A", "1");
        h.add("x-a", "2");
        assert_eq!(h.get_all("X-A").collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(h.get("x-a"), Some("1"));
    }

    #[test]
    fn lenient_parse_line() {
        let mut h = Headers::new();
        h.parse_line("Content-Type:text/plain").unwrap();
        h.parse_line("X-Foo: bar").unwrap();
        h.parse_line(":status: 200").unwrap();
        assert_eq!(h.get("Content-Type"), Some("text/plain"));
        assert_eq!(h.get("X-Foo"), Some("bar"));
        assert_eq!(h.get(":status"), Some("200"));
    }

    #[test]
    fn rejects_crlf_injection() {
        let mut h = Headers::new();
        assert_eq!(
            h.parse_line("X-Foo: bar\r\nEvil: header"),
            Err(HeaderError::InvalidValue)
        );
    }
}
