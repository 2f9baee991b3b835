//! `type/subtype; param=value; ...` media type parsing (§3 "Media type").

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    #[error("media type has no '/': {0:?}")]
    MissingSlash(String),
    #[error("media type has an empty type or subtype: {0:?}")]
    EmptyTypeOrSubtype(String),
    #[error("malformed parameter in media type: {0:?}")]
    MalformedParameter(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    ty: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    pub fn parse(s: &str) -> Result<MediaType, MediaTypeError> {
        let slash = s.find('/').ok_or_else(|| MediaTypeError::MissingSlash(s.to_string()))?;
        let ty = s[..slash].trim().to_ascii_lowercase();

        let rest = &s[slash + 1..];
        let semi = rest.find(';').unwrap_or(rest.len());
        let subtype = rest[..semi].trim().to_ascii_lowercase();
        if ty.is_empty() || subtype.is_empty() {
            return Err(MediaTypeError::EmptyTypeOrSubtype(s.to_string()));
        }

        let mut params = Vec::new();
        let mut remainder = &rest[semi..];
        while let Some(stripped) = remainder.strip_prefix(';') {
            remainder = stripped.trim_start();
            if remainder.is_empty() {
                break;
            }
            let eq = remainder.find('=').ok_or_else(|| MediaTypeError::MalformedParameter(s.to_string()))?;
            let name = remainder[..eq].trim().to_ascii_lowercase();
            remainder = &remainder[eq + 1..];
            let (value, rest_after) = parse_param_value(remainder)
                .ok_or_else(|| MediaTypeError::MalformedParameter(s.to_string()))?;
            params.push((name, value));
            remainder = rest_after;
        }

        Ok(MediaType { ty, subtype, params })
    }
}

/// Parse a parameter value: a quoted-string (with `\`-escapes) or a bare
/// token up to the next `;`. Returns the decoded value and the unconsumed
/// remainder (still starting right after the value, before any `;`).
fn parse_param_value(s: &str) -> Option<(String, &str)> {
    if let Some(rest) = s.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    let (_, escaped) = chars.next()?;
                    value.push(escaped);
                }
                '"' => return Some((value, &rest[i + 1..])),
                other => value.push(other),
            }
        }
        None
    } else {
        let end = s.find(';').unwrap_or(s.len());
        Some((s[..end].trim().to_string(), &s[end..]))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.ty, self.subtype)?;
        for (k, v) in &self.params {
            write!(f, "; {k}={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_simple_type() {
        let m = MediaType::parse("text/plain").unwrap();
        assert_eq!(m.ty(), "text");
        assert_eq!(m.subtype(), "plain");
        assert_eq!(m.charset(), None);
    }

    #[test]
    fn parses_charset_param() {
        let m = MediaType::parse("text/html; charset=UTF-8").unwrap();
        assert_eq!(m.charset(), Some("UTF-8"));
    }

    #[test]
    fn parses_quoted_param_with_escapes() {
        let m = MediaType::parse(r#"multipart/form-data; boundary="a\"b""#).unwrap();
        assert_eq!(m.param("boundary"), Some(r#"a"b"#));
    }

    #[test]
    fn is_case_insensitive_for_type_and_subtype() {
        let m = MediaType::parse("TEXT/PLAIN").unwrap();
        assert_eq!(m.ty(), "text");
        assert_eq!(m.subtype(), "plain");
    }

    #[test]
    fn rejects_missing_slash() {
        assert!(matches!(MediaType::parse("text"), Err(MediaTypeError::MissingSlash(_))));
    }
}
