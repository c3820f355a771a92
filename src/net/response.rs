//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response returned by a
//! [`Transport`](crate::net::Transport). It contains the final URL (after redirects),
//! status code + reason, response headers, and the raw body bytes.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for header names and
//!   keeps every `Set-Cookie` entry.
//! - `status_text` is derived from the status code's canonical reason phrase and may be
//!   `"Unknown"` for non-standard codes.
use crate::errors::KakaoLinkError;
use http::HeaderMap;
use serde::de::DeserializeOwned;

/// Simple structure for HTTP responses.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, KakaoLinkError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            KakaoLinkError::Protocol(format!("{} returned malformed JSON ({e}): {}", self.url, self.text()))
        })
    }
}
