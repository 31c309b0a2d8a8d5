//! Transport contract for registry lookups.
//!
//! Adapters only ever need `get(url) -> JSON`. [`UreqFetcher`] is the real
//! transport; [`MockFetcher`] serves canned documents for tests and embedders.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Error from a single registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("{url} has no {what}")]
    Missing { url: String, what: String },
}

/// Issues a plain unauthenticated GET and decodes the body as JSON.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Value, FetchError>;
}

/// Blocking `ureq` agent driven from async code via `spawn_blocking`.
pub struct UreqFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqFetcher {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Fetcher for UreqFetcher {
    async fn get(&self, url: &str) -> Result<Value, FetchError> {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let owned = url.to_string();

        tokio::task::spawn_blocking(move || get_blocking(&agent, &user_agent, &owned))
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?
    }
}

fn get_blocking(agent: &ureq::Agent, user_agent: &str, url: &str) -> Result<Value, FetchError> {
    tracing::debug!(url, "registry lookup");

    let response = match agent
        .get(url)
        .set("User-Agent", user_agent)
        .set("Accept", "application/json")
        .call()
    {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Err(e) => {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            });
        }
    };

    response.into_json().map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone)]
enum Canned {
    Json(Value),
    Status(u16),
    Broken,
    Undecodable,
}

/// Scripted transport: serves canned JSON per URL and counts requests.
///
/// Unknown URLs answer 404. Every call yields once before answering so that
/// concurrent callers actually interleave.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, Canned>>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_json(self, url: impl Into<String>, body: Value) -> Self {
        self.insert(url.into(), Canned::Json(body));
        self
    }

    /// Answer `url` with a non-success status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.insert(url.into(), Canned::Status(status));
        self
    }

    /// Fail `url` at the transport level (connection reset).
    pub fn with_transport_error(self, url: impl Into<String>) -> Self {
        self.insert(url.into(), Canned::Broken);
        self
    }

    /// Answer `url` with a body that is not JSON.
    pub fn with_decode_error(self, url: impl Into<String>) -> Self {
        self.insert(url.into(), Canned::Undecodable);
        self
    }

    /// Number of lookups made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs requested so far, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }

    fn insert(&self, url: String, canned: Canned) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(url, canned);
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        tokio::task::yield_now().await;

        let canned = self
            .responses
            .lock()
            .ok()
            .and_then(|responses| responses.get(url).cloned());

        match canned {
            Some(Canned::Json(body)) => Ok(body),
            Some(Canned::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(Canned::Broken) => Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection reset".to_string(),
            }),
            Some(Canned::Undecodable) => Err(FetchError::Decode {
                url: url.to_string(),
                message: "expected value at line 1 column 1".to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_serves_and_counts() {
        let http = MockFetcher::new()
            .with_json("https://example.test/a", json!({"version": "1.0.0"}))
            .with_status("https://example.test/b", 500);

        let body = http.get("https://example.test/a").await.unwrap();
        assert_eq!(body["version"], "1.0.0");

        let err = http.get("https://example.test/b").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                url: "https://example.test/b".to_string(),
                status: 500
            }
        );

        let err = http.get("https://example.test/missing").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));

        assert_eq!(http.calls(), 3);
        assert_eq!(http.requested()[1], "https://example.test/b");
    }

    #[tokio::test]
    async fn test_mock_transport_error() {
        let http = MockFetcher::new().with_transport_error("https://example.test/down");
        let err = http.get("https://example.test/down").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(err.to_string(), "request to https://example.test/down failed: connection reset");
    }

    #[tokio::test]
    async fn test_mock_decode_error() {
        let http = MockFetcher::new().with_decode_error("https://example.test/html");
        let err = http.get("https://example.test/html").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    /// Answer one request on a localhost port with a raw HTTP response.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{}/pkg", addr)
    }

    #[tokio::test]
    async fn test_ureq_error_status() {
        let url = serve_once("500 Internal Server Error", "oops");
        let http = UreqFetcher::new("pkgstamp-test", Duration::from_secs(5));
        let err = http.get(&url).await.unwrap_err();
        assert_eq!(err, FetchError::Status { url, status: 500 });
    }

    #[tokio::test]
    async fn test_ureq_non_json_body() {
        let url = serve_once("200 OK", "<html>maintenance</html>");
        let http = UreqFetcher::new("pkgstamp-test", Duration::from_secs(5));
        let err = http.get(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_ureq_connection_refused() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let url = format!("http://{}/pkg", addr);
        let http = UreqFetcher::new("pkgstamp-test", Duration::from_secs(5));
        let err = http.get(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "{:?}", err);
    }
}
