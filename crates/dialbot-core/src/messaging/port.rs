use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Cross-messenger port.
///
/// Telegram is the first implementation; the dial bot only ever pushes short
/// plain-text notifications, so the surface is a single call. Future adapters
/// (Slack/Discord) can fit behind the same interface.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Deliver one plain-text message to a chat. Best effort: callers on the
    /// webhook path log failures and move on.
    async fn deliver(&self, chat_id: ChatId, text: &str) -> Result<()>;
}
