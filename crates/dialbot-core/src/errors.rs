/// Core error type for the dial bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (user-facing message vs webhook-safe
/// fallback).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid destination number: {0}")]
    Validation(String),

    /// The telephony API rejected the call. `code` is the provider's own
    /// numeric error code when the response body carried one.
    #[error("provider error: {message}")]
    Provider { code: Option<u32>, message: String },

    #[error("correlation token error: {0}")]
    Decode(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
