use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::FailureKind;

/// Why a page produced no body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a single GET. Produced once per URL and never modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    /// Absent when the request never got a response
    pub http_status: Option<u16>,
    pub body: Option<String>,
    pub error: Option<FetchFailure>,
}

impl FetchResult {
    /// Classify a completed HTTP exchange
    pub fn from_response(url: &str, status: u16, body: String) -> Self {
        let error = match status {
            403 => Some(FetchFailure {
                kind: FailureKind::Blocked,
                message: "403 Forbidden (blocked by anti-bot rules)".to_string(),
            }),
            200..=299 => None,
            other => Some(FetchFailure {
                kind: FailureKind::Network,
                message: format!("Request failed: HTTP {}", other),
            }),
        };

        FetchResult {
            url: url.to_string(),
            http_status: Some(status),
            body: if error.is_none() { Some(body) } else { None },
            error,
        }
    }

    /// A request that failed below HTTP (DNS, connect, timeout, TLS, body read)
    pub fn transport_failure(url: &str, cause: impl std::fmt::Display) -> Self {
        FetchResult {
            url: url.to_string(),
            http_status: None,
            body: None,
            error: Some(FetchFailure {
                kind: FailureKind::Network,
                message: format!("Request failed: {}", cause),
            }),
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.error, Some(FetchFailure { kind: FailureKind::Blocked, .. }))
    }
}

/// Anything that can turn a URL into a classified `FetchResult`.
///
/// Implementations make exactly one attempt and never return an error:
/// every failure is folded into the result.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> FetchResult;
}

/// Blocking HTTP fetcher with a fixed browser-like identity
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    accept_language: String,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FetchResult {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept-Language", &self.accept_language)
            .call();

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                return FetchResult::transport_failure(url, e);
            }
        };

        let status = response.status().as_u16();
        let body = match response.into_body().read_to_string() {
            Ok(body) => body,
            Err(e) => {
                warn!(url, status, error = %e, "failed to read response body");
                return FetchResult::transport_failure(url, e);
            }
        };

        let result = FetchResult::from_response(url, status, body);
        match &result.error {
            Some(failure) => warn!(url, status, kind = ?failure.kind, "page rejected"),
            None => debug!(url, status, bytes = result.body.as_ref().map_or(0, |b| b.len()), "page fetched"),
        }
        result
    }
}

/// Check that a candidate is an absolute http(s) URL with a host
pub fn is_valid_url(candidate: &str) -> bool {
    match url::Url::parse(candidate.trim()) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Keep the first `max_pages` valid URLs, in order
pub fn select_candidates(urls: &[String], max_pages: usize) -> Vec<String> {
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| is_valid_url(u))
        .take(max_pages)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a local port and return its URL
    fn serve_once(content_type: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 2048];
            let _ = stream.read(&mut request);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                content_type,
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        format!("http://{}/reviews", addr)
    }

    #[test]
    fn test_403_is_blocked_without_body() {
        let result = FetchResult::from_response("https://example.com", 403, "<html>denied</html>".into());
        assert!(result.is_blocked());
        assert_eq!(result.http_status, Some(403));
        assert!(result.body.is_none());
        assert!(result.error.unwrap().message.contains("anti-bot"));
    }

    #[test]
    fn test_other_status_is_network_failure_with_code() {
        let result = FetchResult::from_response("https://example.com", 503, String::new());
        let failure = result.error.unwrap();
        assert_eq!(failure.kind, FailureKind::Network);
        assert!(failure.message.contains("503"));
    }

    #[test]
    fn test_success_keeps_body() {
        let result = FetchResult::from_response("https://example.com", 200, "<p>hi</p>".into());
        assert!(result.error.is_none());
        assert_eq!(result.body.as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn test_transport_failure_keeps_cause() {
        let result = FetchResult::transport_failure("https://nowhere.invalid", "dns error: no such host");
        assert_eq!(result.http_status, None);
        let failure = result.error.unwrap();
        assert_eq!(failure.kind, FailureKind::Network);
        assert_eq!(failure.message, "Request failed: dns error: no such host");
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://example.com/reviews"));
        assert!(is_valid_url("  http://example.com "));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("javascript:alert(1)"));
    }

    #[test]
    fn test_select_candidates_filters_and_caps() {
        let urls = vec![
            "notaurl".to_string(),
            "https://a.com/1".to_string(),
            "mailto:x@y.z".to_string(),
            "https://b.com/2".to_string(),
            "https://c.com/3".to_string(),
        ];
        assert_eq!(select_candidates(&urls, 2), vec!["https://a.com/1", "https://b.com/2"]);
    }

    #[test]
    fn test_legacy_charset_page_is_decoded() {
        // "Caf\xe9 cr\xe8me" in ISO-8859-1 is not valid UTF-8
        let mut body = b"<html><body><p>Caf".to_vec();
        body.push(0xE9);
        body.extend_from_slice(b" cr");
        body.push(0xE8);
        body.extend_from_slice(b"me</p></body></html>");
        let url = serve_once("text/html; charset=ISO-8859-1", body);

        let result = HttpFetcher::new(&FetchConfig::default()).fetch(&url);
        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.http_status, Some(200));
        assert!(result.body.unwrap().contains("Café crème"));
    }
}
