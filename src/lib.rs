//! Log in to Kakao's web accounts and share KakaoLink messages into chat rooms.
//!
//! [`KakaoLink`] drives two handshakes over the platform's web endpoints: the login flow, which
//! fills a session cookie jar, and the share flow, which reuses that jar to deliver a link
//! template into a chat room found by its exact title.
pub mod client;
pub mod config;
pub mod cookies;
pub mod crypto;
pub mod errors;
pub mod markup;
pub mod net;
pub mod session;
pub mod share;

pub use client::KakaoLink;
pub use config::{ClientConfig, Endpoints, ValidationError};
pub use errors::KakaoLinkError;
