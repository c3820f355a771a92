use crate::errors::KakaoLinkError;
use crate::net::{Body, Request, Response, Transport};

/// Production [`Transport`] on top of `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, KakaoLinkError> {
        // Cookies are tracked by the session jar, never by the client.
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured client, e.g. one with a timeout or proxy.
    ///
    /// The client must not have a cookie store enabled.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    // Sends the request and returns the buffered response
    async fn execute(&self, request: Request) -> Result<Response, KakaoLinkError> {
        let builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        let builder = match request.body {
            Body::Empty => builder,
            Body::Form(fields) => {
                let form = fields
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, (k, v)| form.text(k, v));
                builder.multipart(form)
            }
            Body::Json(text) => builder.body(text),
        };

        let res = builder.send().await?;

        // Fetch results
        let final_url = res.url().clone();
        let status = res.status().as_u16();
        let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
        let headers = res.headers().clone();

        // Fetch body. We don't do streaming
        let body = res.bytes().await?.to_vec();

        Ok(Response {
            url: final_url,
            status,
            status_text,
            headers,
            body,
        })
    }
}
