//! The public client.
use log::debug;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::errors::KakaoLinkError;
use crate::net::{ReqwestTransport, Transport};
use crate::session::{self, SessionState};
use crate::share::{self, DEFAULT_TEMPLATE_TYPE};

/// A Kakao web session able to share links into chat rooms.
///
/// Every operation takes `&mut self`: one instance runs at most one handshake at a time. Create
/// one instance per logical session to work in parallel.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), kakaolink::KakaoLinkError> {
/// use kakaolink::KakaoLink;
///
/// let mut kakao = KakaoLink::new("0123456789abcdef0123456789abcdef", "https://example.com")?;
/// kakao.login("user@example.com", "password").await?;
/// kakao.send("My Room", &serde_json::json!({ "link_ver": "4.0", "template_id": 1 })).await?;
/// # Ok(()) }
/// ```
pub struct KakaoLink<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    session: SessionState,
}

impl KakaoLink<ReqwestTransport> {
    /// Validates `app_key` and `origin` and creates a client on the default transport.
    pub fn new(app_key: &str, origin: &str) -> Result<Self, KakaoLinkError> {
        let config = ClientConfig::new(app_key, origin)?;
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }
}

impl<T: Transport> KakaoLink<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            session: SessionState::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Logs in with the account's email and password.
    ///
    /// Calling it again re-runs the whole handshake and replaces the session cookies.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), KakaoLinkError> {
        session::login(&self.transport, &self.config, &mut self.session, email, password).await
    }

    /// Sends a `custom` template link to the chat room titled `room`.
    pub async fn send<P: Serialize + ?Sized>(&mut self, room: &str, params: &P) -> Result<(), KakaoLinkError> {
        self.send_with_type(room, params, DEFAULT_TEMPLATE_TYPE).await
    }

    /// Sends a link built from `params` with the given template type (e.g. `custom`,
    /// `default`, `scrap`).
    pub async fn send_with_type<P: Serialize + ?Sized>(
        &mut self,
        room: &str,
        params: &P,
        template_type: &str,
    ) -> Result<(), KakaoLinkError> {
        share::send(&self.transport, &self.config, &mut self.session, room, params, template_type).await
    }

    /// Forgets the session. The next [`send`](Self::send) fails until [`login`](Self::login)
    /// succeeds again.
    pub fn logout(&mut self) {
        debug!("dropping session state");
        self.session.reset();
    }
}
