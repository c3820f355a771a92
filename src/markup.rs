//! Markup queries against pages returned by the platform.
//!
//! The extracted values live in undocumented page markup that can change without notice. Every
//! lookup the flows depend on is a named function here, so a markup change is patched in one
//! place.
use scraper::{Html, Selector};

use crate::errors::KakaoLinkError;

/// Name of the hidden input carrying the login page's encryption key.
pub const ENCRYPTION_KEY_INPUT: &str = "p";

/// Id of the hidden input carrying the validated link payload.
pub const VALIDATED_LINK_INPUT: &str = "validatedTalkLink";

/// Attribute holding the sharer's initialization call.
pub const CSRF_ATTRIBUTE: &str = "ng-init";

fn selector(s: &str) -> Result<Selector, KakaoLinkError> {
    Selector::parse(s).map_err(|e| KakaoLinkError::Protocol(format!("invalid selector {s:?}: {e:?}")))
}

/// `value` of the first `input` whose `name` is `name`.
pub fn input_value_by_name(html: &str, name: &str) -> Result<Option<String>, KakaoLinkError> {
    let doc = Html::parse_document(html);
    let sel = selector(&format!("input[name=\"{name}\"]"))?;
    let value = doc
        .select(&sel)
        .next()
        .and_then(|e| e.value().attr("value"))
        .map(str::to_string);
    Ok(value)
}

/// `value` of the element whose `id` is `id`.
pub fn input_value_by_id(html: &str, id: &str) -> Result<Option<String>, KakaoLinkError> {
    let doc = Html::parse_document(html);
    let sel = selector(&format!("[id=\"{id}\"]"))?;
    let value = doc
        .select(&sel)
        .next()
        .and_then(|e| e.value().attr("value"))
        .map(str::to_string);
    Ok(value)
}

/// Extracts the CSRF token from a link validation page.
///
/// Expected shape: the **last** `div` of the document carries an `ng-init` attribute whose
/// first single-quoted argument is the token, e.g. `ng-init="init('TOKEN', ...)"`.
///
/// Any deviation (no `div`, no `ng-init`, no quoted argument, empty token) means the page was
/// served to an unauthenticated session and yields [`KakaoLinkError::SessionExpired`].
pub fn csrf_token(html: &str) -> Result<String, KakaoLinkError> {
    let doc = Html::parse_document(html);
    let sel = selector("div")?;

    let token = doc
        .select(&sel)
        .last()
        .and_then(|div| div.value().attr(CSRF_ATTRIBUTE))
        .and_then(|init| init.split('\'').nth(1))
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    token.ok_or(KakaoLinkError::SessionExpired)
}
