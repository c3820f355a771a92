//! Logs in and shares one link.
//!
//! ```text
//! KAKAO_APP_KEY=... KAKAO_ORIGIN=https://example.com \
//! KAKAO_EMAIL=me@example.com KAKAO_PASSWORD=... \
//! RUST_LOG=kakaolink=debug cargo run --example share_link -- "My Room" '{"link_ver":"4.0","template_id":1}' [custom]
//! ```
use anyhow::{bail, Context, Result};
use kakaolink::{KakaoLink, KakaoLinkError};

fn env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} is not set"))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(room) = args.next() else {
        bail!("usage: share_link <room> <template-json> [template-type]");
    };
    let params: serde_json::Value = match args.next() {
        Some(raw) => serde_json::from_str(&raw).context("template parameters must be JSON")?,
        None => bail!("missing template parameters"),
    };
    let template_type = args.next().unwrap_or_else(|| "custom".to_string());

    let mut kakao = KakaoLink::new(&env("KAKAO_APP_KEY")?, &env("KAKAO_ORIGIN")?)?;
    kakao.login(&env("KAKAO_EMAIL")?, &env("KAKAO_PASSWORD")?).await?;

    match kakao.send_with_type(&room, &params, &template_type).await {
        Ok(()) => println!("Sent to {room}"),
        Err(KakaoLinkError::SessionExpired) => {
            log::warn!("session expired right after login, retrying once");
            kakao.login(&env("KAKAO_EMAIL")?, &env("KAKAO_PASSWORD")?).await?;
            kakao.send_with_type(&room, &params, &template_type).await?;
            println!("Sent to {room}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
