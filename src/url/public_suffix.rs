//! Effective-TLD-plus-one lookup over a packed, gzip-compressed rule table
//! (§4.2 "Public suffix" / §6 "Public suffix resource").
//!
//! The table is embedded at compile time and decompressed once, behind a
//! [`OnceCell`], mirroring the "concurrent first-time loaders rendezvous on
//! a one-shot latch" design note. If decompression ever fails (a corrupt
//! asset), lookups fail permanently rather than retrying, per §9's explicit
//! "may be surprising" open question -- this crate preserves that behavior
//! rather than silently reloading.

use std::collections::HashSet;
use std::io::Read;

use once_cell::sync::OnceCell;
use thiserror::Error;

const PACKED: &[u8] = include_bytes!("../../assets/public_suffix_list.dat.gz");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublicSuffixError {
    #[error("public suffix table failed to decompress: {0}")]
    CorruptTable(String),
}

struct Table {
    rules: HashSet<String>,
    wildcards: HashSet<String>,
    exceptions: HashSet<String>,
}

static TABLE: OnceCell<Result<Table, PublicSuffixError>> = OnceCell::new();

fn load() -> &'static Result<Table, PublicSuffixError> {
    TABLE.get_or_init(|| {
        let raw = decompress(PACKED).map_err(|e| PublicSuffixError::CorruptTable(e.to_string()))?;
        if raw.len() < 4 {
            return Err(PublicSuffixError::CorruptTable("truncated header".into()));
        }
        let (rules_blob, rest) = read_section(&raw)?;
        let (exceptions_blob, _) = read_section(rest)?;

        let mut rules = HashSet::new();
        let mut wildcards = HashSet::new();
        for line in rules_blob.split('\n').filter(|l| !l.is_empty()) {
            if let Some(base) = line.strip_prefix("*.") {
                wildcards.insert(base.to_string());
            } else {
                rules.insert(line.to_string());
            }
        }
        let exceptions: HashSet<String> = exceptions_blob
            .split('\n')
            .filter(|l| !l.is_empty())
            .map(|l| l.trim_start_matches('!').to_string())
            .collect();

        log::debug!("loaded public suffix table: {} rules, {} wildcards, {} exceptions",
            rules.len(), wildcards.len(), exceptions.len());
        Ok(Table { rules, wildcards, exceptions })
    })
}

fn read_section(buf: &[u8]) -> Result<(String, &[u8]), PublicSuffixError> {
    if buf.len() < 4 {
        return Err(PublicSuffixError::CorruptTable("truncated section length".into()));
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let rest = &buf[4..];
    if rest.len() < len {
        return Err(PublicSuffixError::CorruptTable("truncated section body".into()));
    }
    let text = std::str::from_utf8(&rest[..len])
        .map_err(|e| PublicSuffixError::CorruptTable(e.to_string()))?
        .to_string();
    Ok((text, &rest[len..]))
}

fn decompress(packed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(packed).read_to_end(&mut out)?;
    Ok(out)
}

/// Compute the effective-TLD-plus-one of a (already-canonicalized, ASCII)
/// domain, or `None` if the domain is itself a public suffix (or shorter).
pub fn effective_tld_plus_one(domain: &str) -> Result<Option<String>, PublicSuffixError> {
    let table = match load() {
        Ok(t) => t,
        Err(e) => {
            log::warn!("public suffix table unavailable: {e}");
            return Err(e.clone());
        }
    };

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.iter().any(|l| l.is_empty()) {
        return Ok(None);
    }

    let mut exact_match_len = 0usize;
    let mut wildcard_match_len = 0usize;
    let mut wildcard_exception_hit = false;

    for start in 0..labels.len() {
        let candidate = labels[start..].join(".");
        if table.rules.contains(&candidate) && labels.len() - start > exact_match_len {
            exact_match_len = labels.len() - start;
        }
        if start + 1 < labels.len() {
            let rest = labels[start + 1..].join(".");
            if table.wildcards.contains(&rest) && labels.len() - start > wildcard_match_len {
                wildcard_match_len = labels.len() - start;
                wildcard_exception_hit = table.exceptions.contains(&candidate);
            }
        }
    }

    let suffix_len = if wildcard_match_len > 0 {
        if wildcard_exception_hit {
            wildcard_match_len - 1
        } else if wildcard_match_len >= exact_match_len {
            wildcard_match_len
        } else {
            exact_match_len
        }
    } else if exact_match_len > 0 {
        exact_match_len
    } else {
        // Prevailing implicit rule "*": the last label alone is a suffix.
        1
    };

    if suffix_len >= labels.len() {
        return Ok(None);
    }
    Ok(Some(labels[labels.len() - suffix_len - 1..].join(".")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn google_dot_com() {
        assert_eq!(effective_tld_plus_one("google.com").unwrap(), Some("google.com".to_string()));
        assert_eq!(effective_tld_plus_one("www.google.com").unwrap(), Some("google.com".to_string()));
    }

    #[test]
    fn bare_public_suffix_is_none() {
        assert_eq!(effective_tld_plus_one("com").unwrap(), None);
    }

    #[test]
    fn unregistered_single_label_is_none() {
        assert_eq!(effective_tld_plus_one("localhost").unwrap(), None);
        assert_eq!(effective_tld_plus_one("mymacbook").unwrap(), None);
    }

    #[test]
    fn wildcard_rule_and_exception() {
        // "*.ck" makes "foo.ck" itself a public suffix...
        assert_eq!(effective_tld_plus_one("foo.ck").unwrap(), None);
        assert_eq!(effective_tld_plus_one("bar.foo.ck").unwrap(), Some("bar.foo.ck".to_string()));
        // ...except "www.ck", carved out by the exception rule.
        assert_eq!(effective_tld_plus_one("www.ck").unwrap(), Some("www.ck".to_string()));
    }

    #[test]
    fn multi_label_suffix() {
        assert_eq!(effective_tld_plus_one("bbc.co.uk").unwrap(), Some("bbc.co.uk".to_string()));
    }
}
