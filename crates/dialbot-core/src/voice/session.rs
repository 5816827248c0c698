use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, warn};

use crate::{
    config::Config,
    domain::{CallHandle, CallRequest, ChatId, DigitCapture},
    errors::Error,
    messaging::port::MessagingPort,
    ports::{DialPort, DialRequest},
    voice::{token, twiml},
    Result,
};

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[0-9]+$").expect("static regex"))
}

/// Orchestrates the three HTTP-facing stages of a call's lifecycle:
/// initiate, answer, capture.
///
/// Holds no per-call state. Everything a later callback needs travels in the
/// callback URL as a correlation token, so concurrent calls never interact
/// and a process restart loses nothing.
pub struct CallSessionController {
    cfg: Arc<Config>,
    dialer: Arc<dyn DialPort>,
    messenger: Arc<dyn MessagingPort>,
}

impl CallSessionController {
    pub fn new(
        cfg: Arc<Config>,
        dialer: Arc<dyn DialPort>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            cfg,
            dialer,
            messenger,
        }
    }

    /// Validate the destination and ask the provider to place the call.
    ///
    /// The answer-callback URL carries the encoded originator, which is the
    /// only thing linking the telephony leg back to the chat user.
    pub async fn initiate(&self, request: CallRequest) -> Result<CallHandle> {
        if !phone_re().is_match(&request.destination) {
            return Err(Error::Validation(request.destination));
        }

        let answer_url = format!(
            "{}/voice/answer?token={}",
            self.cfg.webhook_base_url,
            token::encode(request.originator)
        );

        let handle = self
            .dialer
            .dial(DialRequest {
                to: request.destination.clone(),
                from: self.cfg.twilio_phone_number.clone(),
                answer_url,
                ring_timeout: self.cfg.ring_timeout,
            })
            .await?;

        info!(call = %handle.0, to = %request.destination, "outbound call accepted");
        Ok(handle)
    }

    /// Answer-stage webhook: greet and gather one digit.
    ///
    /// A token that fails to decode yields the invalid-session script; the
    /// provider must always receive a well-formed response.
    pub fn handle_answer(&self, call_token: Option<&str>) -> twiml::VoiceScript {
        let originator = match self.decode(call_token) {
            Ok(chat_id) => chat_id,
            Err(e) => {
                warn!("answer callback with undecodable token: {e}");
                return twiml::invalid_session_script();
            }
        };

        let capture_url = format!(
            "{}/voice/capture?token={}",
            self.cfg.webhook_base_url,
            token::encode(originator)
        );
        twiml::answer_script(&capture_url)
    }

    /// Capture-stage webhook: relay the digits to the originating chat and
    /// close the leg.
    ///
    /// Delivery is best effort and bounded by the configured deadline; its
    /// failure never changes the script, since the telephony side must still
    /// terminate cleanly.
    pub async fn handle_capture(&self, capture: DigitCapture) -> twiml::VoiceScript {
        let originator = match self.decode(capture.token.as_deref()) {
            Ok(chat_id) => chat_id,
            Err(e) => {
                warn!("capture callback with undecodable token: {e}");
                return twiml::invalid_session_script();
            }
        };

        self.notify_capture(originator, &capture.digits).await;
        twiml::capture_script()
    }

    async fn notify_capture(&self, originator: ChatId, digits: &str) {
        let text = notification_text(digits);
        let delivery = self.messenger.deliver(originator, &text);

        match tokio::time::timeout(self.cfg.notify_timeout, delivery).await {
            Ok(Ok(())) => {
                info!(chat = originator.0, digits = digits.len(), "capture delivered");
            }
            Ok(Err(e)) => {
                warn!(chat = originator.0, "capture delivery failed: {e}");
            }
            Err(_) => {
                warn!(
                    chat = originator.0,
                    "capture delivery abandoned after {:?}", self.cfg.notify_timeout
                );
            }
        }
    }

    fn decode(&self, call_token: Option<&str>) -> Result<ChatId> {
        let Some(call_token) = call_token else {
            return Err(Error::Decode("missing token".to_string()));
        };
        token::decode(call_token)
    }
}

fn notification_text(digits: &str) -> String {
    if digits.is_empty() {
        "☎️ The call was answered, but no key was pressed.".to_string()
    } else {
        format!("✅ User pressed: {digits}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::voice::twiml::Verb;

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            telegram_bot_token: "tok".to_string(),
            telegram_allowed_users: vec![],
            twilio_account_sid: "AC123".to_string(),
            twilio_auth_token: "secret".to_string(),
            twilio_phone_number: "+15550001111".to_string(),
            twilio_api_base: "https://api.twilio.com".to_string(),
            webhook_base_url: "https://bot.example".to_string(),
            port: 3000,
            ring_timeout: Duration::from_secs(120),
            notify_timeout: Duration::from_millis(50),
        })
    }

    #[derive(Default)]
    struct RecordingDialer {
        requests: Mutex<Vec<DialRequest>>,
        fail_with: Mutex<Option<Error>>,
    }

    #[async_trait]
    impl DialPort for RecordingDialer {
        async fn dial(&self, req: DialRequest) -> Result<CallHandle> {
            self.requests.lock().unwrap().push(req);
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            Ok(CallHandle("CA123".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        delivered: Mutex<Vec<(i64, String)>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn deliver(&self, chat_id: ChatId, text: &str) -> Result<()> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::Delivery("blocked".to_string()));
            }
            self.delivered
                .lock()
                .unwrap()
                .push((chat_id.0, text.to_string()));
            Ok(())
        }
    }

    fn controller(
        dialer: Arc<RecordingDialer>,
        messenger: Arc<RecordingMessenger>,
    ) -> CallSessionController {
        CallSessionController::new(test_config(), dialer, messenger)
    }

    fn request(destination: &str) -> CallRequest {
        CallRequest {
            destination: destination.to_string(),
            originator: ChatId(42),
        }
    }

    #[tokio::test]
    async fn initiate_rejects_bad_numbers_without_dialing() {
        let dialer = Arc::new(RecordingDialer::default());
        let ctl = controller(dialer.clone(), Arc::new(RecordingMessenger::default()));

        for bad in ["", "abc", "15551234567", "+", "+1555 123", "+1555x"] {
            let err = ctl.initiate(request(bad)).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{bad:?}");
        }
        assert!(dialer.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn initiate_dials_with_correlated_answer_url() {
        let dialer = Arc::new(RecordingDialer::default());
        let ctl = controller(dialer.clone(), Arc::new(RecordingMessenger::default()));

        let handle = ctl.initiate(request("+15551234567")).await.unwrap();
        assert_eq!(handle, CallHandle("CA123".to_string()));

        let reqs = dialer.requests.lock().unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].to, "+15551234567");
        assert_eq!(reqs[0].from, "+15550001111");
        assert_eq!(reqs[0].ring_timeout, Duration::from_secs(120));
        assert_eq!(
            reqs[0].answer_url,
            format!(
                "https://bot.example/voice/answer?token={}",
                token::encode(ChatId(42))
            )
        );
    }

    #[tokio::test]
    async fn initiate_surfaces_provider_errors() {
        let dialer = Arc::new(RecordingDialer::default());
        *dialer.fail_with.lock().unwrap() = Some(Error::Provider {
            code: Some(21211),
            message: "invalid 'To' number".to_string(),
        });
        let ctl = controller(dialer, Arc::new(RecordingMessenger::default()));

        let err = ctl.initiate(request("+15551234567")).await.unwrap_err();
        assert!(matches!(err, Error::Provider { code: Some(21211), .. }));
    }

    #[tokio::test]
    async fn answer_returns_gather_carrying_the_token() {
        let ctl = controller(
            Arc::new(RecordingDialer::default()),
            Arc::new(RecordingMessenger::default()),
        );

        let tok = token::encode(ChatId(42));
        let script = ctl.handle_answer(Some(&tok));

        let gather = script
            .verbs()
            .iter()
            .find_map(|v| match v {
                Verb::Gather {
                    num_digits, action, ..
                } => Some((*num_digits, action.clone())),
                _ => None,
            })
            .expect("answer script must gather");
        assert_eq!(gather.0, 1);
        assert_eq!(
            gather.1,
            format!("https://bot.example/voice/capture?token={tok}")
        );
    }

    #[tokio::test]
    async fn answer_with_bad_token_returns_terminal_script() {
        let ctl = controller(
            Arc::new(RecordingDialer::default()),
            Arc::new(RecordingMessenger::default()),
        );

        for bad in [None, Some("!!!"), Some("")] {
            let script = ctl.handle_answer(bad);
            assert!(!script.collects_input());
            assert_eq!(script, twiml::invalid_session_script());
        }
    }

    #[tokio::test]
    async fn capture_delivers_digits_to_originator() {
        let messenger = Arc::new(RecordingMessenger::default());
        let ctl = controller(Arc::new(RecordingDialer::default()), messenger.clone());

        let script = ctl
            .handle_capture(DigitCapture {
                token: Some(token::encode(ChatId(42))),
                digits: "5".to_string(),
            })
            .await;

        assert_eq!(script, twiml::capture_script());
        assert!(!script.collects_input());
        assert_eq!(
            *messenger.delivered.lock().unwrap(),
            vec![(42, "✅ User pressed: 5".to_string())]
        );
    }

    #[tokio::test]
    async fn capture_with_empty_digits_sends_no_input_notice() {
        let messenger = Arc::new(RecordingMessenger::default());
        let ctl = controller(Arc::new(RecordingDialer::default()), messenger.clone());

        ctl.handle_capture(DigitCapture {
            token: Some(token::encode(ChatId(42))),
            digits: String::new(),
        })
        .await;

        let delivered = messenger.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].1.contains("no key was pressed"));
    }

    #[tokio::test]
    async fn capture_script_unchanged_when_delivery_fails() {
        let messenger = Arc::new(RecordingMessenger {
            fail: true,
            ..Default::default()
        });
        let ctl = controller(Arc::new(RecordingDialer::default()), messenger);

        let script = ctl
            .handle_capture(DigitCapture {
                token: Some(token::encode(ChatId(42))),
                digits: "5".to_string(),
            })
            .await;

        assert_eq!(script, twiml::capture_script());
    }

    #[tokio::test]
    async fn capture_abandons_slow_delivery_at_the_deadline() {
        let messenger = Arc::new(RecordingMessenger {
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        });
        let ctl = controller(Arc::new(RecordingDialer::default()), messenger.clone());

        let started = std::time::Instant::now();
        let script = ctl
            .handle_capture(DigitCapture {
                token: Some(token::encode(ChatId(42))),
                digits: "7".to_string(),
            })
            .await;

        assert_eq!(script, twiml::capture_script());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(messenger.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn capture_with_bad_token_skips_delivery() {
        let messenger = Arc::new(RecordingMessenger::default());
        let ctl = controller(Arc::new(RecordingDialer::default()), messenger.clone());

        let script = ctl
            .handle_capture(DigitCapture {
                token: Some("not-a-token!".to_string()),
                digits: "5".to_string(),
            })
            .await;

        assert_eq!(script, twiml::invalid_session_script());
        assert!(messenger.delivered.lock().unwrap().is_empty());
    }
}
