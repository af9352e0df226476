//! Request header sets for the portal protocol.
//!
//! The portal fronts a browser application and its WAF expects
//! browser-shaped traffic, so every request carries a browser profile plus
//! per-step fetch-metadata headers.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL, USER_AGENT};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (platform; rv:geckoversion) Gecko/geckotrail Firefox/firefoxversion";

/// Headers common to every protocol request, installed as the client's
/// default header set.
#[must_use]
pub fn browser_profile() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(
        HeaderName::from_static("dnt"),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(
            "\"Google Chrome\";v=\"95\", \"Chromium\";v=\"95\", \";Not A Brand\";v=\"99\"",
        ),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// Fetch-metadata headers for an XHR-style request within the portal origin.
#[must_use]
pub fn xhr_fetch_metadata() -> HeaderMap {
    fetch_metadata("same-origin", "cors", "empty")
}

/// Fetch-metadata headers for the cross-site navigation that performs the
/// token exchange.
#[must_use]
pub fn navigation_fetch_metadata() -> HeaderMap {
    let mut headers = fetch_metadata("same-site", "navigate", "document");
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers
}

fn fetch_metadata(site: &'static str, mode: &'static str, dest: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static(site),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static(mode),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static(dest),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_profile_carries_user_agent() {
        let headers = browser_profile();
        assert!(headers.contains_key(USER_AGENT));
        assert_eq!(headers.get("dnt").unwrap(), "1");
    }

    #[test]
    fn navigation_metadata_marks_user_navigation() {
        let headers = navigation_fetch_metadata();
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get("sec-fetch-user").unwrap(), "?1");
    }

    #[test]
    fn xhr_metadata_is_same_origin_cors() {
        let headers = xhr_fetch_metadata();
        assert_eq!(headers.get("sec-fetch-site").unwrap(), "same-origin");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "cors");
        assert_eq!(headers.get("sec-fetch-dest").unwrap(), "empty");
    }
}
