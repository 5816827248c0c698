use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tracing::info;

use dialbot_core::{config::Config, voice::session::CallSessionController};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub sessions: Arc<CallSessionController>,
}

/// Run the Telegram side of the bot (long polling).
///
/// The webhook server runs as a sibling task; both share the same injected
/// `CallSessionController`.
pub async fn run_polling(
    cfg: Arc<Config>,
    bot: Bot,
    sessions: Arc<CallSessionController>,
) -> anyhow::Result<()> {
    if let Ok(me) = bot.get_me().await {
        info!("dialbot started: @{}", me.username());
    }
    if cfg.telegram_allowed_users.is_empty() {
        info!("no allowlist configured; accepting commands from anyone");
    } else {
        info!("allowed users: {}", cfg.telegram_allowed_users.len());
    }

    let state = Arc::new(AppState { cfg, sessions });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
