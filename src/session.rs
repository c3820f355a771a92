//! Session state and the login handshake.
//!
//! A [`SessionState`] is the only mutable state of a client. The handshake steps below take it
//! by reference and each documents which cookies it reads and which it writes.
//!
//! ```text
//!   GET login page ──200──▶ referer, encryption key, _kadu/_kadub/_maldive_…
//!        │                         │
//!        └──401──▶ Config          ▼
//!                            GET tiara ──▶ TIARA
//!                                  │
//!                                  ▼
//!   POST authenticate.json ──status 0──▶ _kawlt/_kawltea/_karmt/_karmtea
//! ```
use http::header::{COOKIE, REFERER, USER_AGENT};
use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::cookies::{SessionCookieJar, LOGIN_PAGE_COOKIES, SESSION_COOKIES, TIARA_COOKIE};
use crate::crypto;
use crate::errors::KakaoLinkError;
use crate::markup;
use crate::net::{Body, Request, Transport};

/// Cookie jar and referer of one logical session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    jar: SessionCookieJar,
    referer: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jar(&self) -> &SessionCookieJar {
        &self.jar
    }

    /// Final URL of the last successful login page fetch.
    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// True once a credential submission has stored the long-lived session cookies.
    pub fn is_authenticated(&self) -> bool {
        self.jar.contains_all(&SESSION_COOKIES)
    }

    pub(crate) fn jar_mut(&mut self) -> &mut SessionCookieJar {
        &mut self.jar
    }

    /// Drops every cookie and the referer.
    pub fn reset(&mut self) {
        self.jar.clear();
        self.referer = None;
    }
}

/// What the login page hands back, consumed by the credential submission.
struct LoginPage {
    referer: String,
    encryption_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    status: i64,
}

/// Runs the full login handshake for `email` / `password`.
pub(crate) async fn login<T: Transport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    state: &mut SessionState,
    email: &str,
    password: &str,
) -> Result<(), KakaoLinkError> {
    let page = fetch_login_page(transport, config, state).await?;
    submit_credentials(transport, config, state, &page, email, password).await?;
    info!("login succeeded");
    Ok(())
}

/// Fetches the login page and harvests the pre-login cookies.
///
/// Reads: nothing. Writes: referer, `_kadu`, `_kadub`, `_maldive_oauth_webapp_session_key`,
/// `TIARA`.
async fn fetch_login_page<T: Transport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    state: &mut SessionState,
) -> Result<LoginPage, KakaoLinkError> {
    let endpoints = config.endpoints();
    debug!("fetching login page {}", endpoints.login_page);

    let request = Request::get(endpoints.login_page.clone())
        .header(USER_AGENT, config.client_signature())?
        .header(REFERER, &endpoints.login_referer)?;
    let response = transport.execute(request).await?;

    match response.status {
        401 => {
            warn!("application key rejected by the platform");
            Err(KakaoLinkError::Config)
        }
        200 => {
            let referer = response.url.to_string();
            let encryption_key = markup::input_value_by_name(&response.text(), markup::ENCRYPTION_KEY_INPUT)?
                .ok_or_else(|| KakaoLinkError::Protocol("login page carries no encryption key".into()))?;

            let mut cookies = SessionCookieJar::take(&response.headers, &LOGIN_PAGE_COOKIES)
                .map_err(|missing| missing_cookies("login page", &missing))?;
            cookies.extend(fetch_tiara(transport, config).await?);

            state.jar.merge(cookies);
            state.referer = Some(referer.clone());

            Ok(LoginPage { referer, encryption_key })
        }
        status => Err(KakaoLinkError::Protocol(format!(
            "application key verification failed with status {status}"
        ))),
    }
}

/// Side request whose only purpose is the `TIARA` cookie.
async fn fetch_tiara<T: Transport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
) -> Result<Vec<(String, String)>, KakaoLinkError> {
    let response = transport.execute(Request::get(config.endpoints().tiara.clone())).await?;
    debug!("tiara responded with {}", response.status);

    SessionCookieJar::take(&response.headers, &[TIARA_COOKIE])
        .map_err(|missing| missing_cookies("tiara endpoint", &missing))
}

/// Posts the encrypted credentials and stores the long-lived session cookies.
///
/// Reads: referer and every cookie in the jar. Writes: `_kawlt`, `_kawltea`, `_karmt`,
/// `_karmtea`.
async fn submit_credentials<T: Transport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    state: &mut SessionState,
    page: &LoginPage,
    email: &str,
    password: &str,
) -> Result<(), KakaoLinkError> {
    let form = Body::form([
        ("os", "web".to_string()),
        ("webview_v", "2".to_string()),
        ("email", crypto::encrypt(email, &page.encryption_key)?),
        ("password", crypto::encrypt(password, &page.encryption_key)?),
        ("continue", continuation_url(&page.referer)?),
        ("third", "false".to_string()),
        ("k", "true".to_string()),
    ]);

    let endpoints = config.endpoints();
    debug!("submitting credentials to {}", endpoints.authenticate);

    let request = Request::post(endpoints.authenticate.clone(), form)
        .header(USER_AGENT, config.client_signature())?
        .header(REFERER, &page.referer)?
        .header(COOKIE, &state.jar.header_all())?;
    let response = transport.execute(request).await?;

    let body = response.text();
    let result: AuthenticateResponse = serde_json::from_str(&body)
        .map_err(|e| KakaoLinkError::Protocol(format!("unexpected login response ({e}): {body}")))?;
    debug!("credential submission returned status {}", result.status);

    match result.status {
        -450 => Err(KakaoLinkError::BadCredentials),
        -481 | -484 => Err(KakaoLinkError::AccountState { body }),
        0 => {
            let cookies = SessionCookieJar::take(&response.headers, &SESSION_COOKIES)
                .map_err(|missing| missing_cookies("credential submission", &missing))?;
            state.jar.merge(cookies);
            Ok(())
        }
        _ => Err(KakaoLinkError::Login { body }),
    }
}

/// Percent-decoded text following the first `continue=` of `referer`, up to the next one.
pub fn continuation_url(referer: &str) -> Result<String, KakaoLinkError> {
    let encoded = referer
        .split("continue=")
        .nth(1)
        .ok_or_else(|| KakaoLinkError::Protocol(format!("login referer {referer} has no continue parameter")))?;

    percent_decode_str(encoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| KakaoLinkError::Protocol(format!("continue parameter is not UTF-8: {e}")))
}

fn missing_cookies(step: &str, missing: &[String]) -> KakaoLinkError {
    KakaoLinkError::Protocol(format!("{step} did not set cookies: {}", missing.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::URI_COMPONENT;
    use crate::net::mock::{response, with_cookies, MockTransport};
    use percent_encoding::utf8_percent_encode;

    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const LOGIN_URL: &str =
        "https://accounts.kakao.com/login?continue=https%3A%2F%2Faccounts.kakao.com%2Fweblogin%2Faccount%2Finfo";

    fn config() -> ClientConfig {
        ClientConfig::new(KEY, "https://example.com").unwrap()
    }

    fn login_page() -> crate::net::Response {
        with_cookies(
            response(LOGIN_URL, 200, r#"<form><input type="hidden" name="p" value="page-key"></form>"#),
            &["_kadu=du; Path=/", "_kadub=dub; Path=/", "_maldive_oauth_webapp_session_key=mal; HttpOnly"],
        )
    }

    fn tiara() -> crate::net::Response {
        with_cookies(response("https://stat.tiara.kakao.com/track", 200, ""), &["TIARA=ti; Path=/"])
    }

    fn authenticated(status: i64) -> crate::net::Response {
        let res = response(
            "https://accounts.kakao.com/weblogin/authenticate.json",
            200,
            &format!(r#"{{"status":{status}}}"#),
        );
        if status == 0 {
            with_cookies(res, &["_kawlt=lt", "_kawltea=ltea", "_karmt=rmt", "_karmtea=rmtea"])
        } else {
            res
        }
    }

    #[tokio::test]
    async fn successful_login_fills_the_jar() {
        let _ = env_logger::builder().is_test(true).try_init();
        let transport = MockTransport::new([login_page(), tiara(), authenticated(0)]);
        let mut state = SessionState::new();

        login(&transport, &config(), &mut state, "user@example.com", "pw").await.unwrap();

        assert!(state.is_authenticated());
        assert_eq!(state.referer(), Some(LOGIN_URL));
        for name in ["_kadu", "_kadub", "_maldive_oauth_webapp_session_key", "TIARA"] {
            assert!(state.jar().get(name).is_some(), "{name}");
        }
        assert_eq!(state.jar().get("_kawlt"), Some("lt"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].headers[USER_AGENT], config().client_signature());
        assert_eq!(requests[0].headers[REFERER], "https://accounts.kakao.com");

        let submit = &requests[2];
        assert_eq!(submit.url.as_str(), "https://accounts.kakao.com/weblogin/authenticate.json");
        assert_eq!(submit.headers[REFERER], LOGIN_URL);
        let cookie = submit.headers[COOKIE].to_str().unwrap();
        assert!(cookie.contains("_kadu=du") && cookie.contains("TIARA=ti"));
        assert_eq!(
            submit.body.form_field("continue"),
            Some("https://accounts.kakao.com/weblogin/account/info")
        );
        assert_eq!(submit.body.form_field("os"), Some("web"));
        let email = submit.body.form_field("email").unwrap();
        assert!(email.starts_with("U2FsdGVkX1"));
        assert!(!email.contains("user@example.com"));
    }

    #[tokio::test]
    async fn rejected_app_key_stops_after_first_request() {
        let transport = MockTransport::new([response(LOGIN_URL, 401, "")]);
        let mut state = SessionState::new();

        let err = login(&transport, &config(), &mut state, "a", "b").await.unwrap_err();

        assert!(matches!(err, KakaoLinkError::Config));
        assert_eq!(transport.requests().len(), 1);
        assert!(state.jar().is_empty());
        assert_eq!(state.referer(), None);
    }

    #[tokio::test]
    async fn unexpected_login_page_status_is_protocol_error() {
        let transport = MockTransport::new([response(LOGIN_URL, 500, "")]);
        let err = login(&transport, &config(), &mut SessionState::new(), "a", "b").await.unwrap_err();
        assert!(matches!(err, KakaoLinkError::Protocol(_)));
    }

    #[tokio::test]
    async fn missing_encryption_key_is_protocol_error() {
        let page = with_cookies(response(LOGIN_URL, 200, "<form></form>"), &["_kadu=1"]);
        let transport = MockTransport::new([page]);
        let err = login(&transport, &config(), &mut SessionState::new(), "a", "b").await.unwrap_err();
        assert!(matches!(err, KakaoLinkError::Protocol(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_bad_credentials() {
        let transport = MockTransport::new([login_page(), tiara(), authenticated(-450)]);
        let mut state = SessionState::new();

        let err = login(&transport, &config(), &mut state, "a", "b").await.unwrap_err();

        assert!(matches!(err, KakaoLinkError::BadCredentials));
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn verification_states_carry_the_body() {
        for status in [-481, -484] {
            let transport = MockTransport::new([login_page(), tiara(), authenticated(status)]);
            let err = login(&transport, &config(), &mut SessionState::new(), "a", "b").await.unwrap_err();

            match err {
                KakaoLinkError::AccountState { body } => assert!(body.contains(&status.to_string())),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn other_statuses_are_login_errors() {
        let transport = MockTransport::new([login_page(), tiara(), authenticated(-1)]);
        let err = login(&transport, &config(), &mut SessionState::new(), "a", "b").await.unwrap_err();
        assert!(matches!(err, KakaoLinkError::Login { .. }));
    }

    #[tokio::test]
    async fn non_json_submission_response_is_protocol_error() {
        let html = response("https://accounts.kakao.com/weblogin/authenticate.json", 502, "<html>bad gateway</html>");
        let transport = MockTransport::new([login_page(), tiara(), html]);
        let err = login(&transport, &config(), &mut SessionState::new(), "a", "b").await.unwrap_err();
        assert!(matches!(err, KakaoLinkError::Protocol(_)));
    }

    #[tokio::test]
    async fn missing_session_cookies_are_not_merged() {
        let partial = with_cookies(
            response("https://accounts.kakao.com/weblogin/authenticate.json", 200, r#"{"status":0}"#),
            &["_kawlt=lt"],
        );
        let transport = MockTransport::new([login_page(), tiara(), partial]);
        let mut state = SessionState::new();

        let err = login(&transport, &config(), &mut state, "a", "b").await.unwrap_err();

        assert!(matches!(err, KakaoLinkError::Protocol(_)));
        assert_eq!(state.jar().get("_kawlt"), None);
    }

    #[test]
    fn continuation_requires_parameter() {
        assert!(continuation_url("https://accounts.kakao.com/login").is_err());
        assert_eq!(continuation_url("https://a/login?continue=").unwrap(), "");
    }

    proptest::proptest! {
        #[test]
        fn continuation_round_trips(target in "\\PC{0,40}") {
            let fragment = utf8_percent_encode(&target, URI_COMPONENT).to_string();
            let referer = format!("https://accounts.kakao.com/login?continue={fragment}");

            let decoded = continuation_url(&referer).unwrap();
            proptest::prop_assert_eq!(&decoded, &target);
            proptest::prop_assert_eq!(utf8_percent_encode(&decoded, URI_COMPONENT).to_string(), fragment);
        }
    }
}
