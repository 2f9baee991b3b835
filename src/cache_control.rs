//! `Cache-Control` directive enumeration (§4.4 "Inputs considered"), shared
//! between request and response headers.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub no_transform: bool,
    pub only_if_cached: bool,
    pub must_revalidate: bool,
    pub public: bool,
    pub private: bool,
    pub max_age: Option<u64>,
    pub s_maxage: Option<u64>,
    pub max_stale: Option<u64>,
    /// `max-stale` with no value means "accept any staleness".
    pub max_stale_unbounded: bool,
    pub min_fresh: Option<u64>,
    pub immutable: bool,
}

impl CacheControl {
    /// Parse the concatenation of all `Cache-Control` header values.
    pub fn parse(values: impl Iterator<Item = impl AsRef<str>>) -> CacheControl {
        let mut cc = CacheControl::default();
        for value in values {
            for directive in value.as_ref().split(',') {
                let directive = directive.trim();
                if directive.is_empty() {
                    continue;
                }
                let (name, arg) = match directive.split_once('=') {
                    Some((n, v)) => (n.trim(), Some(v.trim().trim_matches('"'))),
                    None => (directive, None),
                };
                match name.to_ascii_lowercase().as_str() {
                    "no-cache" => cc.no_cache = true,
                    "no-store" => cc.no_store = true,
                    "no-transform" => cc.no_transform = true,
                    "only-if-cached" => cc.only_if_cached = true,
                    "must-revalidate" => cc.must_revalidate = true,
                    "public" => cc.public = true,
                    "private" => cc.private = true,
                    "immutable" => cc.immutable = true,
                    "max-age" => cc.max_age = arg.and_then(|v| v.parse().ok()),
                    "s-maxage" => cc.s_maxage = arg.and_then(|v| v.parse().ok()),
                    "min-fresh" => cc.min_fresh = arg.and_then(|v| v.parse().ok()),
                    "max-stale" => match arg.and_then(|v| v.parse().ok()) {
                        Some(n) => cc.max_stale = Some(n),
                        None => cc.max_stale_unbounded = true,
                    },
                    _ => {}
                }
            }
        }
        cc
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_request_directives() {
        let cc = CacheControl::parse(["no-cache, max-age=0, only-if-cached"].into_iter());
        assert!(cc.no_cache);
        assert_eq!(cc.max_age, Some(0));
        assert!(cc.only_if_cached);
    }

    #[test]
    fn unbounded_max_stale() {
        let cc = CacheControl::parse(["max-stale"].into_iter());
        assert!(cc.max_stale_unbounded);
        assert_eq!(cc.max_stale, None);
    }

    #[test]
    fn bounded_max_stale() {
        let cc = CacheControl::parse(["max-stale=30"].into_iter());
        assert_eq!(cc.max_stale, Some(30));
    }

    #[test]
    fn merges_multiple_header_instances() {
        let cc = CacheControl::parse(["no-store", "max-age=60"].into_iter());
        assert!(cc.no_store);
        assert_eq!(cc.max_age, Some(60));
    }
}
