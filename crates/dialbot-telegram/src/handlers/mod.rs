//! Telegram update handlers.
//!
//! The dial bot's chat surface is commands only; plain messages are ignored
//! so the bot stays quiet in group chats.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use dialbot_core::domain::UserId;
use dialbot_core::security::is_authorized;

use crate::router::AppState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user_id = msg.from().map(|u| u.id.0);

    if !is_authorized(
        user_id.map(|id| UserId(id as i64)),
        &state.cfg.telegram_allowed_users,
    ) {
        let _ = bot
            .send_message(
                msg.chat.id,
                "Unauthorized. Contact the bot owner for access.",
            )
            .await;
        return Ok(());
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    Ok(())
}
