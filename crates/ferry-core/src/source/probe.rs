//! Interpret probe response headers into source metadata.

use reqwest::header::{HeaderMap, ACCEPT_RANGES, CONTENT_LENGTH, ETAG};

/// Result of a HEAD probe: the headers that matter for planning a relay.
#[derive(Debug, Clone)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    /// `ETag` value if present, quotes stripped.
    pub etag: Option<String>,
}

/// Parse response headers into a `HeadResult`.
pub(crate) fn head_result_from_headers(headers: &HeaderMap) -> HeadResult {
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let accept_ranges = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("bytes"))
        .unwrap_or(false);

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().trim_matches('"').to_string());

    HeadResult {
        content_length,
        accept_ranges,
        etag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn content_length_and_ranges() {
        let r = head_result_from_headers(&headers(&[
            ("content-length", "12345"),
            ("accept-ranges", "bytes"),
        ]));
        assert_eq!(r.content_length, Some(12345));
        assert!(r.accept_ranges);
        assert!(r.etag.is_none());
    }

    #[test]
    fn etag_quotes_stripped() {
        let r = head_result_from_headers(&headers(&[("etag", "\"abc-123\"")]));
        assert_eq!(r.etag.as_deref(), Some("abc-123"));
    }

    #[test]
    fn accept_ranges_none_is_not_ranged() {
        let r = head_result_from_headers(&headers(&[
            ("content-length", "999"),
            ("accept-ranges", "none"),
        ]));
        assert_eq!(r.content_length, Some(999));
        assert!(!r.accept_ranges);
    }

    #[test]
    fn missing_headers_yield_defaults() {
        let r = head_result_from_headers(&HeaderMap::new());
        assert!(r.content_length.is_none());
        assert!(!r.accept_ranges);
        assert!(r.etag.is_none());
    }

    #[test]
    fn garbled_content_length_ignored() {
        let r = head_result_from_headers(&headers(&[("content-length", "not-a-number")]));
        assert!(r.content_length.is_none());
    }
}
