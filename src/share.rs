//! The link share handshake.
//!
//! Three dependent requests, all reusing the cookies of a logged-in [`SessionState`]:
//!
//! 1. post the template to the friend picker, which validates it and answers with a page
//!    holding the validated link payload and a CSRF token;
//! 2. fetch the chat list with that token and look the target room up by exact title;
//! 3. post the message to the dispatch endpoint.
use http::header::{HeaderName, CONTENT_TYPE, COOKIE, REFERER, USER_AGENT};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::cookies::{
    SessionCookieJar, DISPATCH_REQUEST_COOKIES, PICKER_REQUEST_COOKIES, SHARER_COOKIE, USING_COOKIE,
};
use crate::errors::KakaoLinkError;
use crate::markup;
use crate::net::{Body, Request, Transport};
use crate::session::SessionState;

/// Template type used when the caller does not pick one.
pub const DEFAULT_TEMPLATE_TYPE: &str = "custom";

const CSRF_TOKEN: HeaderName = HeaderName::from_static("csrf-token");
const APP_KEY: HeaderName = HeaderName::from_static("app-key");
const JSON_UTF8: &str = "application/json;charset=UTF-8";

/// What the picker page hands to the later steps.
struct ShareContext {
    csrf_token: String,
    validated_link: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatList {
    #[serde(default)]
    chats: Vec<Chat>,
    #[serde(default)]
    security_key: Value,
}

#[derive(Debug, Deserialize)]
struct Chat {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchMessage<'a> {
    receiver_chat_room_member_count: [u32; 1],
    receiver_ids: [&'a Value; 1],
    receiver_type: &'static str,
    security_key: &'a Value,
    validated_talk_link: &'a Value,
}

/// Sends the link described by `params` to the chat room titled `room`.
///
/// Fails with [`KakaoLinkError::SessionExpired`] without touching the network when `state` holds
/// no long-lived session cookies.
pub(crate) async fn send<T: Transport + ?Sized, P: Serialize + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    state: &mut SessionState,
    room: &str,
    params: &P,
    template_type: &str,
) -> Result<(), KakaoLinkError> {
    if !state.is_authenticated() {
        warn!("share attempted without an authenticated session");
        return Err(KakaoLinkError::SessionExpired);
    }

    let context = validate_template(transport, config, state, params, template_type).await?;
    let (chat_id, security_key) = resolve_room(transport, config, state, &context, room).await?;
    dispatch(transport, config, state, &context, &chat_id, &security_key).await?;

    info!("link sent to chat room {room:?}");
    Ok(())
}

/// Submits the template to the picker.
///
/// Reads: referer, `TIARA`, `_kawlt`, `_kawltea`, `_karmt`, `_karmtea`. Writes: `KSHARER`,
/// `using`.
async fn validate_template<T: Transport + ?Sized, P: Serialize + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    state: &mut SessionState,
    params: &P,
    template_type: &str,
) -> Result<ShareContext, KakaoLinkError> {
    let params = serde_json::to_string(params)
        .map_err(|e| KakaoLinkError::Protocol(format!("template parameters are not serializable: {e}")))?;
    let form = Body::form([
        ("app_key", config.app_key().to_string()),
        ("validation_action", template_type.to_string()),
        ("validation_params", params),
        ("ka", config.client_signature().to_string()),
        ("lcba", String::new()),
    ]);

    let endpoints = config.endpoints();
    debug!("validating {template_type} template at {}", endpoints.picker);

    let request = Request::post(endpoints.picker.clone(), form)
        .header(USER_AGENT, config.client_signature())?
        .header(REFERER, state.referer().unwrap_or(endpoints.login_referer.as_str()))?
        .header(COOKIE, &state.jar().header_for(&PICKER_REQUEST_COOKIES))?;
    let response = transport.execute(request).await?;

    match response.status {
        400 => Err(KakaoLinkError::TemplateValidation),
        200 => {
            let jar = state.jar_mut();
            match SessionCookieJar::take(&response.headers, &[SHARER_COOKIE]) {
                Ok(cookies) => jar.merge(cookies),
                Err(_) => debug!("picker did not renew {SHARER_COOKIE}"),
            }
            jar.insert(USING_COOKIE, "true");

            let html = response.text();
            let csrf_token = markup::csrf_token(&html)?;
            let raw_link = markup::input_value_by_id(&html, markup::VALIDATED_LINK_INPUT)?
                .ok_or_else(|| KakaoLinkError::Protocol("picker page carries no validated link".into()))?;
            let validated_link = serde_json::from_str(&raw_link)
                .map_err(|e| KakaoLinkError::Protocol(format!("validated link is not JSON: {e}")))?;

            Ok(ShareContext { csrf_token, validated_link })
        }
        status => Err(KakaoLinkError::Protocol(format!(
            "template validation failed with status {status}"
        ))),
    }
}

/// Looks up the id of the chat titled `room` and the security key of the chat list.
///
/// Reads: every cookie in the jar. Writes: nothing.
async fn resolve_room<T: Transport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    state: &SessionState,
    context: &ShareContext,
    room: &str,
) -> Result<(Value, Value), KakaoLinkError> {
    let endpoints = config.endpoints();
    let request = Request::get(endpoints.chats.clone())
        .header(USER_AGENT, config.client_signature())?
        .header(REFERER, endpoints.picker.as_str())?
        .header(CSRF_TOKEN, &context.csrf_token)?
        .header(APP_KEY, config.app_key())?
        .header(COOKIE, &state.jar().header_all())?;
    let response = transport.execute(request).await?;

    if !response.is_success() {
        return Err(KakaoLinkError::Protocol(format!(
            "chat list request failed with status {}",
            response.status
        )));
    }

    let list: ChatList = response.json()?;
    debug!("chat list holds {} chats", list.chats.len());

    let chat = find_chat(&list.chats, room).ok_or_else(|| KakaoLinkError::RoomNotFound { room: room.to_string() })?;
    Ok((chat.id.clone(), list.security_key))
}

/// Exact, case-sensitive title match. Chats without an id never match.
fn find_chat<'a>(chats: &'a [Chat], room: &str) -> Option<&'a Chat> {
    chats
        .iter()
        .find(|c| c.title.as_deref() == Some(room))
        .filter(|c| !c.id.is_null())
}

/// Posts the message.
///
/// Reads: `KSHARER`, `TIARA`, `using`, `_kadu`, `_kadub`, `_kawlt`, `_kawltea`, `_karmt`,
/// `_karmtea`. Writes: nothing.
async fn dispatch<T: Transport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    state: &SessionState,
    context: &ShareContext,
    chat_id: &Value,
    security_key: &Value,
) -> Result<(), KakaoLinkError> {
    let message = DispatchMessage {
        receiver_chat_room_member_count: [1],
        receiver_ids: [chat_id],
        receiver_type: "chat",
        security_key,
        validated_talk_link: &context.validated_link,
    };
    let body = serde_json::to_string(&message)
        .map_err(|e| KakaoLinkError::Protocol(format!("cannot encode message: {e}")))?;

    let endpoints = config.endpoints();
    let request = Request::post(endpoints.dispatch.clone(), Body::Json(body))
        .header(USER_AGENT, config.client_signature())?
        .header(REFERER, endpoints.picker.as_str())?
        .header(CSRF_TOKEN, &context.csrf_token)?
        .header(APP_KEY, config.app_key())?
        .header(CONTENT_TYPE, JSON_UTF8)?
        .header(COOKIE, &state.jar().header_for(&DISPATCH_REQUEST_COOKIES))?;
    let response = transport.execute(request).await?;

    if response.is_success() {
        Ok(())
    } else {
        Err(KakaoLinkError::Protocol(format!(
            "message dispatch failed with status {}: {}",
            response.status,
            response.text()
        )))
    }
}
