//! Scripted transport for protocol tests.
use std::collections::VecDeque;
use std::sync::Mutex;

use http::header::{HeaderValue, SET_COOKIE};
use http::HeaderMap;

use crate::errors::KakaoLinkError;
use crate::net::{Request, Response, Transport};

/// Replays queued responses in order and records every request it receives.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new(responses: impl IntoIterator<Item = Response>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: Response) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: Request) -> Result<Response, KakaoLinkError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| KakaoLinkError::Network(format!("no scripted response for {}", request.url)))
    }
}

/// Builds a canned response.
pub(crate) fn response(url: &str, status: u16, body: &str) -> Response {
    Response {
        url: url.parse().unwrap(),
        status,
        status_text: String::new(),
        headers: HeaderMap::new(),
        body: body.as_bytes().to_vec(),
    }
}

/// Adds one `Set-Cookie` entry per item of `cookies`.
pub(crate) fn with_cookies(mut res: Response, cookies: &[&str]) -> Response {
    for c in cookies {
        res.headers.append(SET_COOKIE, HeaderValue::from_str(c).unwrap());
    }
    res
}
