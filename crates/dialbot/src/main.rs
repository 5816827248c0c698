use std::sync::Arc;

use dialbot_core::{config::Config, voice::session::CallSessionController, Error};
use dialbot_telegram::TelegramMessenger;
use dialbot_twilio::TwilioClient;

mod server;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dialbot_core::logging::init("dialbot")?;

    let cfg = Arc::new(Config::load()?);

    // Clients are constructed once here and injected; nothing holds them as
    // process-global state.
    let dialer = Arc::new(TwilioClient::with_api_base(
        cfg.twilio_api_base.clone(),
        cfg.twilio_account_sid.clone(),
        cfg.twilio_auth_token.clone(),
    ));
    let messenger = Arc::new(TelegramMessenger::from_token(&cfg.telegram_bot_token));
    let bot = messenger.bot();

    let sessions = Arc::new(CallSessionController::new(cfg.clone(), dialer, messenger));

    let webhook = server::run(cfg.clone(), sessions.clone());
    let polling = dialbot_telegram::router::run_polling(cfg, bot, sessions);

    // Either side exiting tears the process down; there is nothing useful a
    // half-alive bot could do.
    tokio::select! {
        r = webhook => r,
        r = polling => r.map_err(|e| Error::External(format!("telegram bot failed: {e}"))),
    }
}
