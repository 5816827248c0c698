use std::sync::Arc;

use teloxide::prelude::*;

use tracing::warn;

use dialbot_core::{
    domain::{CallRequest, ChatId},
    errors::Error,
};

use crate::router::AppState;

const USAGE: &str = "👋 I can place a phone call and message you back with \
whatever key the callee presses.\n\nUsage: /call +15551234567";

const INVALID_NUMBER: &str =
    "❌ Please provide a valid phone number. Example: /call +123456789";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, args) = parse_command(text);

    match cmd.as_str() {
        "call" => handle_call(bot, msg, state, &args).await,
        "start" | "help" => {
            let _ = bot.send_message(msg.chat.id, USAGE).await;
            Ok(())
        }
        _ => {
            let _ = bot
                .send_message(msg.chat.id, format!("Unknown command /{cmd}.\n\n{USAGE}"))
                .await;
            Ok(())
        }
    }
}

async fn handle_call(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    args: &str,
) -> ResponseResult<()> {
    let number = args.split_whitespace().next().unwrap_or("").to_string();

    let request = CallRequest {
        destination: number.clone(),
        originator: ChatId(msg.chat.id.0),
    };

    let reply = match state.sessions.initiate(request).await {
        Ok(_handle) => format!("📞 Calling {number}..."),
        Err(err) => {
            warn!(chat = msg.chat.id.0, "call initiation failed: {err}");
            format_call_error(&err)
        }
    };

    let _ = bot.send_message(msg.chat.id, reply).await;
    Ok(())
}

fn format_call_error(err: &Error) -> String {
    match err {
        Error::Validation(_) => INVALID_NUMBER.to_string(),
        Error::Provider { code, message } => {
            let mut out = "❌ Failed to make the call.".to_string();
            if let Some(code) = code {
                out.push_str(&format!("\nError Code: {code}"));
            }
            out.push_str(&format!("\nMessage: {message}"));
            out
        }
        other => format!("❌ Failed to make the call.\nMessage: {other}"),
    }
}
