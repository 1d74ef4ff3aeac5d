//! Client IP extraction from HTTP request headers.

use axum::http::HeaderMap;

/// Fallback when no trusted source of the client address exists.
const LOOPBACK: &str = "127.0.0.1";

/// Resolves the client IP used for rate-limit counting and analytics.
///
/// When `behind_proxy` is set, the first entry of `X-Forwarded-For` wins,
/// then `X-Real-IP`. Otherwise, or when neither header is present, the
/// loopback placeholder is returned; forwarded headers from untrusted
/// clients are never read, since they are trivially spoofable.
pub fn client_ip(headers: &HeaderMap, behind_proxy: bool) -> String {
    if behind_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }

        if let Some(real_ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return real_ip.to_string();
        }
    }

    LOOPBACK.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        assert_eq!(client_ip(&headers, true), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_ip(&headers, true), "198.51.100.2");
    }

    #[test]
    fn test_headers_ignored_when_not_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));

        assert_eq!(client_ip(&headers, false), LOOPBACK);
    }

    #[test]
    fn test_missing_headers_fall_back_to_loopback() {
        assert_eq!(client_ip(&HeaderMap::new(), true), LOOPBACK);
    }
}
