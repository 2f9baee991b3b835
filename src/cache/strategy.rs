//! RFC 7234 cache strategy (§4.4): decide between network and stored
//! response, and compute freshness.

use std::time::{Duration, SystemTime};

use crate::cache_control::CacheControl;
use crate::headers::Headers;

/// A minimal view of a stored response: just the parts the strategy reads.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub status_code: u16,
    pub headers: Headers,
    pub request_method: String,
    pub sent_request_at: SystemTime,
    pub received_response_at: SystemTime,
}

/// `(networkRequest, cacheResponse)`: which collaborator(s) this exchange
/// should actually use, per §4.4's four cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// Serve entirely from the stored response.
    UseCache,
    /// Issue a conditional request; combine with the stored response on 304.
    Revalidate,
    /// Go to the network with no conditional headers; no usable stored copy.
    Network,
    /// Neither network nor cache is usable (`only-if-cached` with no hit).
    Unsatisfiable,
}

const DEFAULT_CACHEABLE_STATUSES: &[u16] = &[200, 203, 204, 300, 301, 308, 404, 405, 410, 414, 501];

fn is_cacheable_status(code: u16) -> bool {
    DEFAULT_CACHEABLE_STATUSES.contains(&code)
}

/// Decide the cache strategy for `request_cache_control` against an
/// optional `stored` response, as of `now`.
pub fn decide(now: SystemTime, request_cache_control: &CacheControl, stored: Option<&StoredResponse>) -> CacheDecision {
    let Some(stored) = stored else {
        return if request_cache_control.only_if_cached { CacheDecision::Unsatisfiable } else { CacheDecision::Network };
    };

    if request_cache_control.no_store {
        return CacheDecision::Network;
    }
    if !is_cacheable_status(stored.status_code) && !has_explicit_expiry(&stored.headers) {
        return CacheDecision::Network;
    }
    if request_cache_control.only_if_cached {
        return CacheDecision::UseCache;
    }

    let stored_cc = CacheControl::parse(stored.headers.get_all("Cache-Control"));
    if stored_cc.no_store {
        return CacheDecision::Network;
    }
    if request_cache_control.no_cache || stored_cc.no_cache || stored_cc.must_revalidate {
        return CacheDecision::Revalidate;
    }

    let age = compute_age(now, &stored_cc, &stored.headers, stored.sent_request_at, stored.received_response_at);
    let freshness_lifetime = compute_freshness_lifetime(&stored_cc, &stored.headers);

    let max_stale = if request_cache_control.max_stale_unbounded {
        Duration::from_secs(u64::MAX / 2)
    } else {
        request_cache_control.max_stale.map(Duration::from_secs).unwrap_or_default()
    };
    let min_fresh = request_cache_control.min_fresh.map(Duration::from_secs).unwrap_or_default();

    if age + min_fresh < freshness_lifetime + max_stale {
        CacheDecision::UseCache
    } else {
        CacheDecision::Revalidate
    }
}

fn has_explicit_expiry(headers: &Headers) -> bool {
    headers.contains("Expires")
        || CacheControl::parse(headers.get_all("Cache-Control")).max_age.is_some()
        || CacheControl::parse(headers.get_all("Cache-Control")).s_maxage.is_some()
}

/// `age = max(0, now - Date) + max(0, receivedResponseAt - sentRequestAt)/2 + Age`.
fn compute_age(
    now: SystemTime,
    _stored_cc: &CacheControl,
    headers: &Headers,
    sent_request_at: SystemTime,
    received_response_at: SystemTime,
) -> Duration {
    let date_age = headers
        .get("Date")
        .and_then(|v| crate::date::parse(v).ok())
        .map(|date| now.duration_since(date).unwrap_or_default())
        .unwrap_or_default();
    let response_lag = received_response_at.duration_since(sent_request_at).unwrap_or_default() / 2;
    let header_age = headers
        .get("Age")
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_default();
    date_age + response_lag + header_age
}

/// `s-maxage ?? max-age ?? (Expires - Date) ?? heuristic(Last-Modified, Date)/10`.
fn compute_freshness_lifetime(stored_cc: &CacheControl, headers: &Headers) -> Duration {
    if let Some(s) = stored_cc.s_maxage {
        return Duration::from_secs(s);
    }
    if let Some(s) = stored_cc.max_age {
        return Duration::from_secs(s);
    }
    let date = headers.get("Date").and_then(|v| crate::date::parse(v).ok());
    if let (Some(expires), Some(date)) = (headers.get("Expires").and_then(|v| crate::date::parse(v).ok()), date) {
        return expires.duration_since(date).unwrap_or_default();
    }
    if let (Some(last_modified), Some(date)) = (headers.get("Last-Modified").and_then(|v| crate::date::parse(v).ok()), date) {
        return date.duration_since(last_modified).unwrap_or_default() / 10;
    }
    Duration::ZERO
}

/// Build the conditional validator header to add to the network request
/// (§4.4 "Conditional revalidation").
pub fn conditional_headers(stored: &StoredResponse) -> Vec<(&'static str, String)> {
    if let Some(etag) = stored.headers.get("ETag") {
        return vec![("If-None-Match", etag.to_string())];
    }
    if let Some(last_modified) = stored.headers.get("Last-Modified") {
        return vec![("If-Modified-Since", last_modified.to_string())];
    }
    if let Some(date) = stored.headers.get("Date") {
        return vec![("If-Modified-Since", date.to_string())];
    }
    Vec::new()
}

#[cfg(test)]
mod test {
    use super::*;

    fn stored_with(headers: &[(&str, &str)], status: u16) -> StoredResponse {
        let mut h = Headers::new();
        for (k, v) in headers {
            h.add(*k, *v);
        }
        StoredResponse {
            status_code: status,
            headers: h,
            request_method: "GET".to_string(),
            sent_request_at: SystemTime::now(),
            received_response_at: SystemTime::now(),
        }
    }

    #[test]
    fn no_stored_response_goes_to_network() {
        let cc = CacheControl::default();
        assert_eq!(decide(SystemTime::now(), &cc, None), CacheDecision::Network);
    }

    #[test]
    fn only_if_cached_with_no_stored_is_unsatisfiable() {
        let mut cc = CacheControl::default();
        cc.only_if_cached = true;
        assert_eq!(decide(SystemTime::now(), &cc, None), CacheDecision::Unsatisfiable);
    }

    #[test]
    fn fresh_response_is_served_from_cache() {
        let now = SystemTime::now();
        let date = crate::date::format(now);
        let stored = stored_with(&[("Date", &date), ("Cache-Control", "max-age=3600")], 200);
        let cc = CacheControl::default();
        assert_eq!(decide(now, &cc, Some(&stored)), CacheDecision::UseCache);
    }

    #[test]
    fn no_cache_forces_revalidation() {
        let now = SystemTime::now();
        let date = crate::date::format(now);
        let stored = stored_with(&[("Date", &date), ("Cache-Control", "max-age=3600"), ("ETag", "\"abc\"")], 200);
        let mut cc = CacheControl::default();
        cc.no_cache = true;
        assert_eq!(decide(now, &cc, Some(&stored)), CacheDecision::Revalidate);
        assert_eq!(conditional_headers(&stored), vec![("If-None-Match", "\"abc\"".to_string())]);
    }

    #[test]
    fn stale_response_is_revalidated() {
        let now = SystemTime::now();
        let old_date = crate::date::format(now - Duration::from_secs(7200));
        let stored = stored_with(&[("Date", &old_date), ("Cache-Control", "max-age=60")], 200);
        let cc = CacheControl::default();
        assert_eq!(decide(now, &cc, Some(&stored)), CacheDecision::Revalidate);
    }
}
