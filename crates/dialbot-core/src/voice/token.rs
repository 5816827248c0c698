use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::{domain::ChatId, errors::Error, Result};

/// Encode the originating chat id into an opaque, URL-safe correlation token.
///
/// The token is the only call state the server keeps: it rides in every
/// callback URL and is decoded again on each webhook, so handlers stay
/// stateless across restarts.
pub fn encode(originator: ChatId) -> String {
    URL_SAFE_NO_PAD.encode(originator.0.to_string())
}

/// Exact inverse of [`encode`] for any token it produced.
pub fn decode(token: &str) -> Result<ChatId> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Decode("empty token".to_string()));
    }

    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| Error::Decode(format!("bad base64: {e}")))?;
    let text = String::from_utf8(raw)
        .map_err(|_| Error::Decode("token payload is not utf-8".to_string()))?;
    let id = text
        .parse::<i64>()
        .map_err(|_| Error::Decode(format!("token payload is not a chat id: {text:?}")))?;

    Ok(ChatId(id))
}
