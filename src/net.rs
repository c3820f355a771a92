//! Network layer.
//!
//! The protocol flows only talk to the network through the [`Transport`] trait. A request is a
//! plain value ([`Request`]) and every response is fully buffered ([`Response`]) before the
//! flows inspect it, so a transport can be swapped for a scripted one without touching the
//! protocol code.
mod fetch;
mod response;

#[cfg(test)]
pub(crate) mod mock;

pub use fetch::ReqwestTransport;
pub use response::Response;

use crate::errors::KakaoLinkError;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// `multipart/form-data` text fields, in order.
    Form(Vec<(String, String)>),
    /// Pre-serialized JSON text. The caller sets `Content-Type`.
    Json(String),
}

impl Body {
    /// Builds a form body from `(name, value)` pairs.
    pub fn form<'a>(fields: impl IntoIterator<Item = (&'a str, String)>) -> Self {
        Body::Form(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Value of the form field `name`, if this is a form body.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match self {
            Body::Form(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// A single outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, headers: HeaderMap::new(), body: Body::Empty }
    }

    pub fn post(url: Url, body: Body) -> Self {
        Self { method: Method::POST, url, headers: HeaderMap::new(), body }
    }

    /// Sets header `name`, replacing any previous value.
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self, KakaoLinkError> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }
}

/// Something that can carry a [`Request`] to the platform and hand back the buffered
/// [`Response`].
///
/// Implementations must not follow their own cookie policy: cookies are managed by the
/// session and sent explicitly through the `Cookie` header. Redirects should be followed, with
/// [`Response::url`] reporting the final URL.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, KakaoLinkError>;
}
