use crate::config::ValidationError;

/// Every way a [`KakaoLink`](crate::KakaoLink) operation can fail.
///
/// Each variant carries only the context a caller needs to branch on it. A failure always
/// aborts the operation that produced it; nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum KakaoLinkError {
    #[error("Invalid client configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Application key is not recognized by the platform")]
    Config,

    #[error("Email or password is incorrect")]
    BadCredentials,

    #[error("Account requires additional verification: {body}")]
    AccountState { body: String },

    #[error("Login failed: {body}")]
    Login { body: String },

    #[error("Login session has expired, login again")]
    SessionExpired,

    #[error("Chat room {room:?} not found")]
    RoomNotFound { room: String },

    #[error("Template is invalid or the origin does not match the registered domain")]
    TemplateValidation,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for KakaoLinkError {
    fn from(e: reqwest::Error) -> Self {
        KakaoLinkError::Network(e.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for KakaoLinkError {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        KakaoLinkError::Protocol(format!("invalid header value: {e}"))
    }
}
