use std::{
    env, fs,
    path::Path,
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration for the dial bot, sourced from the environment.
///
/// Read once at startup and shared as `Arc<Config>`; nothing mutates it after
/// that.
#[derive(Clone, Debug)]
pub struct Config {
    // Chat side
    pub telegram_bot_token: String,
    /// Empty = open bot; non-empty = only these user ids may issue commands.
    pub telegram_allowed_users: Vec<i64>,

    // Telephony side
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    /// Source (caller id) number used for every outbound call.
    pub twilio_phone_number: String,
    /// Provider API base; overridable so tests can point at a mock server.
    pub twilio_api_base: String,

    // Webhook surface
    /// Externally reachable base URL the provider calls back on, no trailing slash.
    pub webhook_base_url: String,
    pub port: u16,

    // Call policy
    /// Maximum ring time before the provider gives up on the call.
    pub ring_timeout: Duration,
    /// Deadline for the best-effort chat notification during a capture callback.
    pub notify_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = require_env("TELEGRAM_BOT_TOKEN")?;
        let telegram_allowed_users = parse_csv_i64(env_str("TELEGRAM_ALLOWED_USERS"));

        let twilio_account_sid = require_env("TWILIO_SID")?;
        let twilio_auth_token = require_env("TWILIO_AUTH_TOKEN")?;
        let twilio_phone_number = require_env("TWILIO_PHONE_NUMBER")?;
        let twilio_api_base = env_str("TWILIO_API_BASE")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://api.twilio.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let webhook_base_url = require_env("WEBHOOK_URL")?
            .trim_end_matches('/')
            .to_string();
        let port = env_u16("PORT").unwrap_or(3000);

        let ring_timeout = Duration::from_secs(env_u64("RING_TIMEOUT_SECS").unwrap_or(120));
        let notify_timeout = Duration::from_secs(env_u64("NOTIFY_TIMEOUT_SECS").unwrap_or(5));

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            twilio_account_sid,
            twilio_auth_token,
            twilio_phone_number,
            twilio_api_base,
            webhook_base_url,
            port,
            ring_timeout,
            notify_timeout,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    env_str(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u16(key: &str) -> Option<u16> {
    env_str(key).and_then(|s| s.trim().parse::<u16>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
