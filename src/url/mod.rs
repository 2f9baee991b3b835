//! The URL engine (§4.2): parsing, canonicalization, IDN/Punycode, percent
//! encoding and public-suffix lookup for `http`/`https` URLs.

mod encode_sets;
mod error;
mod host;
mod idna;
mod public_suffix;
mod punycode;

pub use error::{ParseError, PunycodeError};
pub use public_suffix::{PublicSuffixError, effective_tld_plus_one};

use std::fmt;
use std::hash::{Hash, Hasher};

/// `http` or `https`; `ws`/`wss` are accepted on input and silently rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    fn parse(s: &str) -> Result<Scheme, ParseError> {
        match s.to_ascii_lowercase().as_str() {
            "http" | "ws" => Ok(Scheme::Http),
            "https" | "wss" => Ok(Scheme::Https),
            other => Err(ParseError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// An eight-field HTTP(S) URL (§3 "URL"): scheme, userinfo, host, port,
/// decoded path segments, decoded query pairs, decoded fragment, plus a
/// memoized canonical string that equality and hashing are defined on.
#[derive(Debug, Clone)]
pub struct HttpUrl {
    scheme: Scheme,
    username: String,
    password: String,
    host: String,
    port: u16,
    path_segments: Vec<String>,
    query: Option<Vec<(String, Option<String>)>>,
    fragment: Option<String>,
    canonical: String,
}

impl HttpUrl {
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    pub fn query_pairs(&self) -> Option<&[(String, Option<String>)]> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Path as it appears on the wire: `/a/b/c`, percent-encoded per segment.
    pub fn encoded_path(&self) -> String {
        if self.path_segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for seg in &self.path_segments {
            out.push('/');
            out.push_str(&encode_sets::encode_path_segment(seg));
        }
        out
    }

    /// `path?query`, the request-line target for an origin-form request.
    pub fn request_target(&self) -> String {
        match &self.query {
            Some(pairs) => format!("{}?{}", self.encoded_path(), encode_query(pairs)),
            None => self.encoded_path(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Effective-TLD-plus-one of this URL's host, or `None` if the host is
    /// itself a public suffix, an IP literal, or has no registrable parent.
    pub fn top_private_domain(&self) -> Result<Option<String>, PublicSuffixError> {
        if self.host.parse::<std::net::IpAddr>().is_ok() || self.host.starts_with('[') {
            return Ok(None);
        }
        effective_tld_plus_one(&self.host)
    }

    pub fn parse(input: &str) -> Result<HttpUrl, ParseError> {
        parse(input)
    }

    /// RFC 3986 §5 relative resolution of `link` against `self` as the base.
    pub fn resolve(&self, link: &str) -> Result<HttpUrl, ParseError> {
        resolve(self, link)
    }
}

impl PartialEq for HttpUrl {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}
impl Eq for HttpUrl {}

impl Hash for HttpUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

fn encode_query(pairs: &[(String, Option<String>)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| match v {
            Some(v) => format!("{}={}", encode_sets::encode_query_component(k), encode_sets::encode_query_component(v)),
            None => encode_sets::encode_query_component(k),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_query(raw: &str) -> Result<Vec<(String, Option<String>)>, ParseError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => Ok((encode_sets::decode(k)?, Some(encode_sets::decode(v)?))),
            None => Ok((encode_sets::decode(pair)?, None)),
        })
        .collect()
}

/// Decode each `/`-separated raw segment and fold `.`/`..` (including their
/// percent-encoded spellings, which decode to the same thing) into `out`,
/// per RFC 3986 §5.2.4. Backslashes must already have been rewritten to
/// forward slashes by the caller.
fn decode_and_fold(raw_path: &str, mut out: Vec<String>) -> Result<Vec<String>, ParseError> {
    for raw_seg in raw_path.split('/') {
        let decoded = encode_sets::decode(raw_seg)?;
        match decoded.as_str() {
            "." => {}
            ".." => {
                out.pop();
            }
            _ => out.push(decoded),
        }
    }
    Ok(out)
}

fn split_authority(authority: &str) -> Result<(String, String, String, Option<String>), ParseError> {
    let (userinfo, hostport) = match authority.split_once('@') {
        Some((u, h)) => (Some(u), h),
        None => (None, authority),
    };
    let (username, password) = match userinfo {
        Some(u) => match u.split_once(':') {
            Some((user, pass)) => (encode_sets::decode(user)?, encode_sets::decode(pass)?),
            None => (encode_sets::decode(u)?, String::new()),
        },
        None => (String::new(), String::new()),
    };

    let (host_part, port) = if let Some(rest) = hostport.strip_prefix('[') {
        let end = rest.find(']').ok_or_else(|| ParseError::InvalidHost(hostport.to_string()))?;
        let host_literal = format!("[{}]", &rest[..end]);
        let after = &rest[end + 1..];
        let port = match after.strip_prefix(':') {
            Some(p) if !p.is_empty() => Some(p.to_string()),
            Some(_) => None,
            None => None,
        };
        (host_literal, port)
    } else {
        match hostport.split_once(':') {
            Some((h, p)) if !p.is_empty() => (h.to_string(), Some(p.to_string())),
            Some((h, _)) => (h.to_string(), None),
            None => (hostport.to_string(), None),
        }
    };

    Ok((username, password, host_part, port))
}

fn parse_port(port: Option<&str>, scheme: Scheme) -> Result<u16, ParseError> {
    match port {
        None => Ok(scheme.default_port()),
        Some(p) => {
            let n: u32 = p.parse().map_err(|_| ParseError::InvalidPort(p.to_string()))?;
            if n == 0 || n > 65535 {
                return Err(ParseError::InvalidPort(p.to_string()));
            }
            Ok(n as u16)
        }
    }
}

fn build_canonical(
    scheme: Scheme,
    username: &str,
    password: &str,
    host: &str,
    port: u16,
    path_segments: &[String],
    query: &Option<Vec<(String, Option<String>)>>,
    fragment: &Option<String>,
) -> String {
    let mut out = String::new();
    out.push_str(scheme.as_str());
    out.push_str("://");
    if !username.is_empty() || !password.is_empty() {
        out.push_str(&encode_sets::encode_userinfo(username));
        if !password.is_empty() {
            out.push(':');
            out.push_str(&encode_sets::encode_userinfo(password));
        }
        out.push('@');
    }
    out.push_str(host);
    if port != scheme.default_port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    if path_segments.is_empty() {
        out.push('/');
    } else {
        for seg in path_segments {
            out.push('/');
            out.push_str(&encode_sets::encode_path_segment(seg));
        }
    }
    if let Some(pairs) = query {
        out.push('?');
        out.push_str(&encode_query(pairs));
    }
    if let Some(frag) = fragment {
        out.push('#');
        out.push_str(&encode_sets::encode_fragment(frag));
    }
    out
}

fn parse(input: &str) -> Result<HttpUrl, ParseError> {
    let scheme_end = input.find("://").ok_or_else(|| ParseError::MissingScheme(input.to_string()))?;
    let scheme = Scheme::parse(&input[..scheme_end])?;
    let rest = &input[scheme_end + 3..];

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    if authority.is_empty() {
        return Err(ParseError::MissingHost(input.to_string()));
    }
    let (username, password, host_literal, port_str) = split_authority(authority)?;
    let host = host::canonicalize(&host_literal)?;
    let port = parse_port(port_str.as_deref(), scheme)?;

    let mut tail = &rest[authority_end..];
    let fragment = if let Some(idx) = tail.find('#') {
        let f = &tail[idx + 1..];
        tail = &tail[..idx];
        Some(encode_sets::decode(f)?)
    } else {
        None
    };
    let query = if let Some(idx) = tail.find('?') {
        let q = &tail[idx + 1..];
        tail = &tail[..idx];
        Some(decode_query(q)?)
    } else {
        None
    };

    let path_no_backslashes = tail.replace('\\', "/");
    let trimmed_path = path_no_backslashes.strip_prefix('/').unwrap_or(&path_no_backslashes);
    let path_segments = decode_and_fold(trimmed_path, Vec::new())?;

    let canonical = build_canonical(scheme, &username, &password, &host, port, &path_segments, &query, &fragment);
    Ok(HttpUrl { scheme, username, password, host, port, path_segments, query, fragment, canonical })
}

fn resolve(base: &HttpUrl, link: &str) -> Result<HttpUrl, ParseError> {
    if link.is_empty() {
        let mut clone = base.clone();
        clone.fragment = None;
        clone.canonical = build_canonical(
            clone.scheme, &clone.username, &clone.password, &clone.host, clone.port,
            &clone.path_segments, &clone.query, &clone.fragment,
        );
        return Ok(clone);
    }
    if link.starts_with('#') {
        let mut clone = base.clone();
        clone.fragment = Some(encode_sets::decode(&link[1..])?);
        clone.canonical = build_canonical(
            clone.scheme, &clone.username, &clone.password, &clone.host, clone.port,
            &clone.path_segments, &clone.query, &clone.fragment,
        );
        return Ok(clone);
    }
    if link.contains("://") {
        return parse(link);
    }
    if let Some(rest) = link.strip_prefix("//") {
        return parse(&format!("{}://{}", base.scheme.as_str(), rest));
    }

    // Authority inherited from base; resolve path/query/fragment only.
    let fragment_idx = link.find('#');
    let (before_fragment, fragment) = match fragment_idx {
        Some(idx) => (&link[..idx], Some(encode_sets::decode(&link[idx + 1..])?)),
        None => (link, None),
    };
    let query_idx = before_fragment.find('?');
    let (raw_path, query) = match query_idx {
        Some(idx) => (&before_fragment[..idx], Some(decode_query(&before_fragment[idx + 1..])?)),
        None => (before_fragment, None),
    };

    let new_segments = if raw_path.is_empty() {
        base.path_segments.clone()
    } else if raw_path.starts_with('/') {
        let trimmed = raw_path.trim_start_matches('/').replace('\\', "/");
        decode_and_fold(&trimmed, Vec::new())?
    } else {
        let mut merged: Vec<String> = base.path_segments.clone();
        merged.pop();
        let trimmed = raw_path.replace('\\', "/");
        decode_and_fold(&trimmed, merged)?
    };

    let query = query.or_else(|| if query_idx.is_none() && raw_path.is_empty() { base.query.clone() } else { None });

    let canonical = build_canonical(
        base.scheme, &base.username, &base.password, &base.host, base.port, &new_segments, &query, &fragment,
    );
    Ok(HttpUrl {
        scheme: base.scheme,
        username: base.username.clone(),
        password: base.password.clone(),
        host: base.host.clone(),
        port: base.port,
        path_segments: new_segments,
        query,
        fragment,
        canonical,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_and_round_trips() {
        let u = HttpUrl::parse("https://example.com/a/b?x=1&y=2#frag").unwrap();
        assert_eq!(u.scheme(), Scheme::Https);
        assert_eq!(u.host(), "example.com");
        assert_eq!(u.port(), 443);
        assert_eq!(u.path_segments(), &["a".to_string(), "b".to_string()]);
        let reparsed = HttpUrl::parse(u.as_str()).unwrap();
        assert_eq!(u, reparsed);
    }

    #[test]
    fn default_port_omitted_from_canonical() {
        let u = HttpUrl::parse("http://example.com:80/").unwrap();
        assert_eq!(u.as_str(), "http://example.com/");
    }

    #[test]
    fn ws_scheme_is_rewritten() {
        let u = HttpUrl::parse("ws://example.com/chat").unwrap();
        assert_eq!(u.scheme(), Scheme::Http);
        assert_eq!(u.as_str(), "http://example.com/chat");
    }

    #[test]
    fn dot_segments_are_folded() {
        let u = HttpUrl::parse("https://example.com/a/b/../c/./d").unwrap();
        assert_eq!(u.path_segments(), &["a".to_string(), "c".to_string(), "d".to_string()]);
    }

    #[test]
    fn idn_host_is_punycoded() {
        let u = HttpUrl::parse("https://☃.net/").unwrap();
        assert_eq!(u.host(), "xn--n3h.net");
    }

    #[test]
    fn resolves_relative_reference() {
        let base = HttpUrl::parse("https://example.com/a/b/c").unwrap();
        let resolved = base.resolve("../d").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a/d");
    }

    #[test]
    fn resolves_absolute_path_reference() {
        let base = HttpUrl::parse("https://example.com/a/b/c?old=1").unwrap();
        let resolved = base.resolve("/x/y").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/x/y");
    }

    #[test]
    fn fragment_only_reference_reuses_query() {
        let base = HttpUrl::parse("https://example.com/a?x=1").unwrap();
        let resolved = base.resolve("#top").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a?x=1#top");
    }

    #[test]
    fn top_private_domain_of_www_is_registrable_domain() {
        let u = HttpUrl::parse("https://www.google.com/").unwrap();
        assert_eq!(u.top_private_domain().unwrap(), Some("google.com".to_string()));
    }
}
