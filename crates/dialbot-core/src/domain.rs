/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). The originator of a call and the recipient of
/// whatever the callee keys in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Provider-assigned identifier for an accepted outbound call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallHandle(pub String);

/// One request to place an outbound call, built from a `/call` command.
///
/// Discarded as soon as the initiate attempt succeeds or fails; nothing about
/// the call is kept server-side after that.
#[derive(Clone, Debug)]
pub struct CallRequest {
    /// Destination number, expected in `+<digits>` form.
    pub destination: String,
    /// Chat to notify once the callee presses a key.
    pub originator: ChatId,
}

/// Keypad input captured by one provider callback.
#[derive(Clone, Debug)]
pub struct DigitCapture {
    /// Correlation token exactly as it arrived in the callback URL, if any.
    pub token: Option<String>,
    /// Digits the callee pressed. Empty when the gather timed out.
    pub digits: String,
}
