//! Client configuration.
//!
//! `ClientConfig` holds everything that stays fixed for the lifetime of a
//! [`KakaoLink`](crate::KakaoLink) instance: the application key, the registered origin, the
//! client signature derived from it, and the platform endpoints.
//!
//! Construction always goes through validation, so a `ClientConfig` that exists is known to
//! carry a 32-character application key and an absolute `http(s)://` origin.
//!
//! # Examples
//!
//! ## Use the production endpoints
//! ```rust
//! use kakaolink::config::ClientConfig;
//! let cfg = ClientConfig::new("0123456789abcdef0123456789abcdef", "https://example.com").unwrap();
//! assert!(cfg.client_signature().ends_with("origin/https%3A%2F%2Fexample.com"));
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use kakaolink::config::{ClientConfig, Endpoints};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoints = Endpoints::default();
//! let cfg = ClientConfig::builder("0123456789abcdef0123456789abcdef", "http://localhost:8080")
//!     .endpoints(endpoints)
//!     .build()?; // returns Result<ClientConfig, ValidationError>
//! # Ok(()) }
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Fixed descriptor sent as user agent, the percent-encoded origin is appended to it.
pub const SDK_DESCRIPTOR: &str = "sdk/1.36.6 os/javascript lang/en-US device/Win32 origin/";

/// Required length of a JavaScript application key.
pub const APP_KEY_LENGTH: usize = 32;

/// Characters left untouched by `encodeURIComponent`.
pub(crate) const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const LOGIN_PAGE: &str = "https://accounts.kakao.com/login?continue=https%3A%2F%2Faccounts.kakao.com%2Fweblogin%2Faccount%2Finfo";
const LOGIN_REFERER: &str = "https://accounts.kakao.com";
const AUTHENTICATE: &str = "https://accounts.kakao.com/weblogin/authenticate.json";
const TIARA: &str = "https://stat.tiara.kakao.com/track?d=%7B%22sdk%22%3A%7B%22type%22%3A%22WEB%22%2C%22version%22%3A%221.1.15%22%7D%7D";
const PICKER: &str = "https://sharer.kakao.com/talk/friends/picker/link";
const CHATS: &str = "https://sharer.kakao.com/api/talk/chats";
const DISPATCH: &str = "https://sharer.kakao.com/api/talk/message/link";

/// Platform endpoints touched by the login and share flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Login page carrying the per-session encryption key.
    pub login_page: Url,
    /// Referer sent when fetching the login page.
    pub login_referer: String,
    /// Credential submission endpoint.
    pub authenticate: Url,
    /// Analytics endpoint handing out the `TIARA` cookie.
    pub tiara: Url,
    /// Link validation (friend picker) page. Also the referer of the later share steps.
    pub picker: Url,
    /// Chat list endpoint.
    pub chats: Url,
    /// Message dispatch endpoint.
    pub dispatch: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        // All inputs are compile-time constants.
        let parse = |s: &str| Url::parse(s).expect("static endpoint URL is valid");
        Self {
            login_page: parse(LOGIN_PAGE),
            login_referer: LOGIN_REFERER.to_string(),
            authenticate: parse(AUTHENTICATE),
            tiara: parse(TIARA),
            picker: parse(PICKER),
            chats: parse(CHATS),
            dispatch: parse(DISPATCH),
        }
    }
}

/// Validated, immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    app_key: String,
    origin: String,
    client_signature: String,
    endpoints: Endpoints,
}

impl ClientConfig {
    /// Validates `app_key` and `origin` and builds a config with the production endpoints.
    pub fn new(app_key: &str, origin: &str) -> Result<Self, ValidationError> {
        Self::builder(app_key, origin).build()
    }

    pub fn builder(app_key: &str, origin: &str) -> ClientConfigBuilder {
        ClientConfigBuilder {
            app_key: app_key.to_string(),
            origin: origin.to_string(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Descriptor sent as `User-Agent` (and as the `ka` form field) on every request.
    pub fn client_signature(&self) -> &str {
        &self.client_signature
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    app_key: String,
    origin: String,
    endpoints: Endpoints,
}

impl ClientConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ClientConfigBuilder)) -> Self {
        f(&mut self);
        self
    }

    pub fn endpoints(self, endpoints: Endpoints) -> Self { self.map(|c| c.endpoints = endpoints) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ClientConfig, ValidationError> {
        validate(&self.app_key, &self.origin)?;

        let client_signature = client_signature(&self.origin);
        Ok(ClientConfig {
            app_key: self.app_key,
            origin: self.origin,
            client_signature,
            endpoints: self.endpoints,
        })
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("application key must be {APP_KEY_LENGTH} characters, got {len}")]
    InvalidAppKeyLength { len: usize },

    #[error("origin {0:?} is not an absolute http(s):// URL")]
    InvalidOrigin(String),
}

fn validate(app_key: &str, origin: &str) -> Result<(), ValidationError> {
    let len = app_key.chars().count();
    if len != APP_KEY_LENGTH {
        return Err(ValidationError::InvalidAppKeyLength { len });
    }

    let rest = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"));
    match rest {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidOrigin(origin.to_string())),
    }
}

/// Builds the client signature for `origin`.
pub fn client_signature(origin: &str) -> String {
    format!("{SDK_DESCRIPTOR}{}", utf8_percent_encode(origin, URI_COMPONENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn valid_input_builds_signature() {
        let cfg = ClientConfig::new(KEY, "https://example.com/path?a=1").unwrap();

        assert_eq!(cfg.app_key(), KEY);
        assert_eq!(
            cfg.client_signature(),
            "sdk/1.36.6 os/javascript lang/en-US device/Win32 origin/https%3A%2F%2Fexample.com%2Fpath%3Fa%3D1"
        );
        assert_eq!(cfg.endpoints(), &Endpoints::default());
    }

    #[test]
    fn plain_http_origin_is_accepted() {
        assert!(ClientConfig::new(KEY, "http://localhost:3000").is_ok());
    }

    #[test]
    fn key_length_is_enforced() {
        let err = ClientConfig::new("short", "https://example.com").unwrap_err();
        assert_eq!(err, ValidationError::InvalidAppKeyLength { len: 5 });

        let long = format!("{KEY}0");
        let err = ClientConfig::new(&long, "https://example.com").unwrap_err();
        assert_eq!(err, ValidationError::InvalidAppKeyLength { len: 33 });
    }

    #[test]
    fn origin_shape_is_enforced() {
        for origin in ["example.com", "ftp://example.com", "https://", "http:/example.com", ""] {
            let err = ClientConfig::new(KEY, origin).unwrap_err();
            assert_eq!(err, ValidationError::InvalidOrigin(origin.to_string()), "{origin}");
        }
    }

    #[test]
    fn encode_uri_component_rules() {
        assert_eq!(
            client_signature("http://a.b/c d!~*'()"),
            format!("{SDK_DESCRIPTOR}http%3A%2F%2Fa.b%2Fc%20d!~*'()")
        );
    }

    #[test]
    fn builder_overrides_endpoints() {
        let mut endpoints = Endpoints::default();
        endpoints.picker = Url::parse("http://localhost:9000/picker").unwrap();

        let cfg = ClientConfig::builder(KEY, "https://example.com")
            .endpoints(endpoints.clone())
            .build()
            .unwrap();
        assert_eq!(cfg.endpoints().picker.as_str(), "http://localhost:9000/picker");
    }

    proptest::proptest! {
        #[test]
        fn signature_contains_encoded_origin_once(host in "[a-z]{1,12}(\\.[a-z]{2,5}){1,2}", https in proptest::bool::ANY) {
            let origin = format!("{}://{host}", if https { "https" } else { "http" });
            let cfg = ClientConfig::new(KEY, &origin).unwrap();
            let encoded = utf8_percent_encode(&origin, URI_COMPONENT).to_string();
            proptest::prop_assert_eq!(cfg.client_signature().matches(encoded.as_str()).count(), 1);
        }

        #[test]
        fn wrong_key_length_always_fails(key in "[a-zA-Z0-9]{0,64}") {
            proptest::prop_assume!(key.len() != APP_KEY_LENGTH);
            let result = ClientConfig::new(&key, "https://example.com");
            proptest::prop_assert!(
                matches!(result, Err(ValidationError::InvalidAppKeyLength { .. })),
                "expected InvalidAppKeyLength error"
            );
        }
    }
}
