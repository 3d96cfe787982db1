//! Static tracker host list and request matching.
//!
//! Malformed URLs are never reported as trackers. Failing open keeps odd but
//! legitimate requests working, at the cost of letting a malformed tracker
//! URL through.

use crate::config::MatchMode;
use crate::error::{RadarError, Result};

pub const TRACKER_DOMAINS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "googlesyndication.com",
    "googleadservices.com",
    "doubleclick.net",
    "facebook.net",
    "snap.licdn.com",
    "analytics.twitter.com",
    "ads-twitter.com",
    "scorecardresearch.com",
    "quantserve.com",
    "hotjar.com",
    "fullstory.com",
    "mouseflow.com",
    "crazyegg.com",
    "mixpanel.com",
    "segment.io",
    "amplitude.com",
    "amazon-adsystem.com",
    "adnxs.com",
    "criteo.com",
    "taboola.com",
    "outbrain.com",
    "rubiconproject.com",
    "pubmatic.com",
    "openx.net",
    "bluekai.com",
    "krxd.net",
    "chartbeat.com",
    "newrelic.com",
    "clarity.ms",
    "bat.bing.com",
];

/// Extract the lowercase host of an absolute or protocol-relative URL.
///
/// Returns `Ok(None)` for relative URLs (same origin, never a tracker).
pub fn parse_host(url: &str) -> Result<Option<String>> {
    let url = url.trim().to_ascii_lowercase();
    if url.is_empty() {
        return Err(RadarError::InvalidUrl("empty".into()));
    }

    let without_scheme = if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else if let Some(rest) = url.strip_prefix("wss://") {
        rest
    } else if let Some(rest) = url.strip_prefix("ws://") {
        rest
    } else if let Some(rest) = url.strip_prefix("//") {
        rest
    } else {
        // Relative paths and non-network schemes (data:, blob:)
        return Ok(None);
    };

    // Authority ends at the first path, query or fragment delimiter
    let authority_end = without_scheme
        .find(|c: char| c == '/' || c == '?' || c == '#')
        .unwrap_or(without_scheme.len());
    let authority = &without_scheme[..authority_end];

    // Drop userinfo
    let host_port = authority.rsplit('@').next().unwrap_or(authority);

    let host = match host_port.rfind(':') {
        Some(colon_pos) if !host_port.ends_with(']') => {
            let port_str = &host_port[colon_pos + 1..];
            if !port_str.is_empty() {
                port_str
                    .parse::<u16>()
                    .map_err(|_| RadarError::InvalidUrl(format!("invalid port: {}", port_str)))?;
            }
            &host_port[..colon_pos]
        }
        _ => host_port,
    };

    if host.is_empty() {
        return Err(RadarError::InvalidUrl(format!("no host in {}", url)));
    }
    if host.starts_with('[') {
        // IPv6 literal; no listed tracker lives on a bare address
        return Ok(None);
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(RadarError::InvalidUrl(format!("invalid host: {}", host)));
    }

    Ok(Some(host.trim_end_matches('.').to_string()))
}

/// Whether `host` belongs to `domain` under the given mode.
pub fn host_matches(host: &str, domain: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Suffix => host.ends_with(domain),
        MatchMode::Boundary => {
            host == domain
                || (host.len() > domain.len()
                    && host.ends_with(domain)
                    && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerMatcher {
    mode: MatchMode,
}

impl TrackerMatcher {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    /// The listed domain matched by `host`, if any.
    pub fn match_host(&self, host: &str) -> Option<&'static str> {
        TRACKER_DOMAINS
            .iter()
            .copied()
            .find(|domain| host_matches(host, domain, self.mode))
    }

    /// Host of `url` when it points at a listed tracker.
    pub fn match_url(&self, url: &str) -> Option<String> {
        match parse_host(url) {
            Ok(Some(host)) => self.match_host(&host).map(|_| host),
            Ok(None) => None,
            Err(e) => {
                log::debug!("Treating unparseable URL as non-tracker: {}", e);
                None
            }
        }
    }
}

impl Default for TrackerMatcher {
    fn default() -> Self {
        Self::new(MatchMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host() {
        assert_eq!(
            parse_host("https://www.google-analytics.com/collect?v=1").unwrap(),
            Some("www.google-analytics.com".into())
        );
        assert_eq!(
            parse_host("HTTP://Ads.Criteo.com:8080/x").unwrap(),
            Some("ads.criteo.com".into())
        );
        assert_eq!(
            parse_host("//cdn.taboola.com/libtrc").unwrap(),
            Some("cdn.taboola.com".into())
        );
        assert_eq!(parse_host("/api/data").unwrap(), None);
        assert_eq!(parse_host("data:image/png;base64,AAAA").unwrap(), None);
    }

    #[test]
    fn test_parse_host_rejects_garbage() {
        assert!(parse_host("").is_err());
        assert!(parse_host("https://").is_err());
        assert!(parse_host("https://exa mple.com/").is_err());
        assert!(parse_host("https://example.com:99999/").is_err());
    }

    #[test]
    fn test_boundary_matching() {
        let matcher = TrackerMatcher::new(MatchMode::Boundary);
        assert_eq!(
            matcher.match_host("google-analytics.com"),
            Some("google-analytics.com")
        );
        assert!(matcher.match_host("sub.google-analytics.com").is_some());
        assert!(matcher.match_host("evilgoogle-analytics.com").is_none());
        assert!(matcher.match_host("example.com").is_none());
    }

    #[test]
    fn test_suffix_matching_is_looser() {
        let matcher = TrackerMatcher::new(MatchMode::Suffix);
        assert!(matcher.match_host("evilgoogle-analytics.com").is_some());
    }

    #[test]
    fn test_malformed_urls_fail_open() {
        let matcher = TrackerMatcher::default();
        assert_eq!(matcher.match_url("https://doubleclick.net:notaport/"), None);
        assert_eq!(matcher.match_url(""), None);
        assert_eq!(
            matcher.match_url("https://stats.g.doubleclick.net/r/collect"),
            Some("stats.g.doubleclick.net".into())
        );
    }

    #[test]
    fn test_list_size() {
        assert!(TRACKER_DOMAINS.len() >= 30);
    }

    #[test]
    fn test_no_entry_is_shadowed_by_another() {
        for (i, domain) in TRACKER_DOMAINS.iter().enumerate() {
            for (j, other) in TRACKER_DOMAINS.iter().enumerate() {
                if i != j {
                    assert!(
                        !domain.ends_with(other),
                        "{} is already covered by {}",
                        domain,
                        other
                    );
                }
            }
        }
    }
}
