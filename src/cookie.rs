//! Cookie record, RFC 6265 `Set-Cookie` parsing/serialization, and the
//! two-method jar interface (§4.7). No jar implementation is provided: the
//! core defines the interface, persistence is a collaborator's job.

use std::time::{Duration, SystemTime};

use thiserror::Error;

use crate::date;
use crate::url::HttpUrl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Absolute expiry. `SystemTime::UNIX_EPOCH` ("MIN") means already
    /// expired; [`SESSION_EXPIRY`] ("MAX", year ~9999) means session-capped.
    pub expires_at: SystemTime,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub persistent: bool,
    pub host_only: bool,
    pub same_site: Option<SameSite>,
}

/// The "MAX ~ year 9999" sentinel for a non-persistent (session) cookie.
pub fn session_expiry() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(253_402_300_799)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CookieError {
    #[error("Set-Cookie header has no name=value pair: {0:?}")]
    MissingNameValue(String),
    #[error("cookie domain {0:?} is a public suffix and was rejected")]
    DomainIsPublicSuffix(String),
}

impl Cookie {
    /// Parse one `Set-Cookie` header value against the URL it was received
    /// on (for default domain/path and the public-suffix rejection check).
    pub fn parse(header_value: &str, request_url: &HttpUrl) -> Result<Cookie, CookieError> {
        let mut parts = header_value.split(';');
        let name_value = parts.next().unwrap_or("").trim();
        let (name, value) = name_value
            .split_once('=')
            .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
            .ok_or_else(|| CookieError::MissingNameValue(header_value.to_string()))?;

        let mut expires_at = session_expiry();
        let mut persistent = false;
        let mut domain: Option<String> = None;
        let mut path: Option<String> = None;
        let mut secure = false;
        let mut http_only = false;
        let mut same_site = None;
        let mut max_age_seen = false;

        for attr in parts {
            let attr = attr.trim();
            if attr.is_empty() {
                continue;
            }
            let (key, arg) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr, None),
            };
            match key.to_ascii_lowercase().as_str() {
                "expires" => {
                    if !max_age_seen {
                        if let Some(v) = arg.and_then(|v| date::parse(v).ok()) {
                            expires_at = v;
                            persistent = true;
                        }
                    }
                }
                "max-age" => {
                    if let Some(secs) = arg.and_then(|v| v.parse::<i64>().ok()) {
                        max_age_seen = true;
                        persistent = true;
                        expires_at = if secs <= 0 {
                            SystemTime::UNIX_EPOCH
                        } else {
                            SystemTime::now() + Duration::from_secs(secs as u64)
                        };
                    }
                }
                "domain" => {
                    if let Some(v) = arg {
                        if !v.is_empty() {
                            domain = Some(v.trim_start_matches('.').to_ascii_lowercase());
                        }
                    }
                }
                "path" => {
                    if let Some(v) = arg {
                        if v.starts_with('/') {
                            path = Some(v.to_string());
                        }
                    }
                }
                "secure" => secure = true,
                "httponly" => http_only = true,
                "samesite" => {
                    same_site = match arg.map(|v| v.to_ascii_lowercase()) {
                        Some(ref v) if v == "strict" => Some(SameSite::Strict),
                        Some(ref v) if v == "lax" => Some(SameSite::Lax),
                        Some(ref v) if v == "none" => Some(SameSite::None),
                        _ => None,
                    };
                }
                _ => {}
            }
        }

        let host_only = domain.is_none();
        let domain = domain.unwrap_or_else(|| request_url.host().to_string());

        let is_public_suffix = crate::url::effective_tld_plus_one(&domain).ok().flatten().is_none();
        if !host_only && is_public_suffix && domain != request_url.host() {
            return Err(CookieError::DomainIsPublicSuffix(domain));
        }

        let path = path.unwrap_or_else(|| default_path(request_url));

        Ok(Cookie {
            name,
            value,
            expires_at,
            domain,
            path,
            secure,
            http_only,
            persistent,
            host_only,
            same_site,
        })
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }

    /// Render as a `name=value` pair suitable for a request's `Cookie` header.
    pub fn to_request_form(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

fn default_path(url: &HttpUrl) -> String {
    let segments = url.path_segments();
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for seg in &segments[..segments.len() - 1] {
        out.push('/');
        out.push_str(seg);
    }
    if out.is_empty() {
        "/".to_string()
    } else {
        out
    }
}

/// `save`/`load` collaborator (§4.7, §6 "Cookie jar"). No implementation is
/// provided here; persistence is out of scope (§1 Non-goals).
pub trait CookieJar {
    fn save(&mut self, url: &HttpUrl, cookies: &[Cookie]);
    fn load(&self, url: &HttpUrl) -> Vec<Cookie>;
}

#[cfg(test)]
mod test {
    use super::*;

    fn url(s: &str) -> HttpUrl {
        HttpUrl::parse(s).unwrap()
    }

    #[test]
    fn parses_basic_cookie() {
        let u = url("https://example.com/a/b");
        let c = Cookie::parse("session=abc123; Path=/a; HttpOnly; Secure", &u).unwrap();
        assert_eq!(c.name, "session");
        assert_eq!(c.value, "abc123");
        assert_eq!(c.path, "/a");
        assert!(c.http_only);
        assert!(c.secure);
        assert!(c.host_only);
    }

    #[test]
    fn default_path_is_up_to_last_slash() {
        let u = url("https://example.com/a/b/c");
        let c = Cookie::parse("x=1", &u).unwrap();
        assert_eq!(c.path, "/a/b");
    }

    #[test]
    fn domain_attribute_clears_host_only() {
        let u = url("https://www.example.com/");
        let c = Cookie::parse("x=1; Domain=.example.com", &u).unwrap();
        assert!(!c.host_only);
        assert_eq!(c.domain, "example.com");
    }

    #[test]
    fn max_age_overrides_expires() {
        let u = url("https://example.com/");
        let c = Cookie::parse(
            "x=1; Expires=Wed, 09 Jun 2021 10:18:14 GMT; Max-Age=0",
            &u,
        )
        .unwrap();
        assert!(c.is_expired(SystemTime::now()));
    }

    #[test]
    fn rejects_public_suffix_domain() {
        let u = url("https://example.com/");
        assert!(Cookie::parse("x=1; Domain=com", &u).is_err());
    }
}
