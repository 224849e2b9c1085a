//! `Accept`/`Mcp-Session-Id` header contract (spec §4.6).
//!
//! Grounded on the teacher's `mcb-server::transport::streamable_http`
//! helpers (`extract_override`/`build_overrides` trimming and reading
//! `HeaderMap` values), adapted from override lookups to the session
//! transport's own required headers.

use axum::http::HeaderMap;

/// Header carrying the session ID minted by `initialize`.
pub const SESSION_ID_HEADER: &str = "Mcp-Session-Id";

/// Header carrying the negotiated protocol version, set on `initialize`'s
/// response alongside [`SESSION_ID_HEADER`] (spec §4.6).
pub const PROTOCOL_VERSION_HEADER: &str = "Mcp-Protocol-Version";

/// Read a header value, trimmed, returning `None` if absent or not valid
/// UTF-8.
#[must_use]
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim)
}

/// The `Accept` header MUST contain both `application/json` and
/// `text/event-stream` (spec §4.6).
#[must_use]
pub fn accepts_streamable_http(headers: &HeaderMap) -> bool {
    let Some(accept) = header_str(headers, axum::http::header::ACCEPT.as_str()) else {
        return false;
    };
    accept.contains("application/json") && accept.contains("text/event-stream")
}

/// Extract the `Mcp-Session-Id` header, trimmed.
#[must_use]
pub fn session_id(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, SESSION_ID_HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn accepts_streamable_http_requires_both_media_types() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, HeaderValue::from_static("application/json, text/event-stream"));
        assert!(accepts_streamable_http(&headers));
    }

    #[test]
    fn accepts_streamable_http_rejects_json_only() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!accepts_streamable_http(&headers));
    }

    #[test]
    fn accepts_streamable_http_rejects_missing_header() {
        assert!(!accepts_streamable_http(&HeaderMap::new()));
    }

    #[test]
    fn session_id_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static(" abc-123 "));
        assert_eq!(session_id(&headers), Some("abc-123"));
    }
}
