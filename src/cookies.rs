//! Cookies: the in-memory [`SessionCookieJar`] and the cookie names each protocol step needs.

mod cookie_jar;

pub use cookie_jar::SessionCookieJar;

/// Cookies handed out by the login page.
pub const LOGIN_PAGE_COOKIES: [&str; 3] = ["_kadu", "_kadub", "_maldive_oauth_webapp_session_key"];

/// Analytics cookie harvested from the tiara endpoint.
pub const TIARA_COOKIE: &str = "TIARA";

/// Long-lived cookies set by a successful credential submission.
pub const SESSION_COOKIES: [&str; 4] = ["_kawlt", "_kawltea", "_karmt", "_karmtea"];

/// Sharer-scoped cookie set by the link validation step.
pub const SHARER_COOKIE: &str = "KSHARER";

/// Marker cookie flagging the jar as in use by the sharer.
pub const USING_COOKIE: &str = "using";

/// Sent with the link validation request.
pub const PICKER_REQUEST_COOKIES: [&str; 5] = ["TIARA", "_kawlt", "_kawltea", "_karmt", "_karmtea"];

/// Sent with the message dispatch request.
pub const DISPATCH_REQUEST_COOKIES: [&str; 9] = [
    "KSHARER", "TIARA", "using", "_kadu", "_kadub", "_kawlt", "_kawltea", "_karmt", "_karmtea",
];
