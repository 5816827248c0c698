//! Twilio adapter (reqwest).
//!
//! Implements the `dialbot-core` DialPort over the Twilio Programmable Voice
//! REST API: one form-encoded POST per outbound call, basic auth, JSON
//! responses. No provider state is kept beyond the pooled HTTP client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use dialbot_core::{
    domain::CallHandle,
    errors::Error,
    ports::{DialPort, DialRequest},
    Result,
};

const DEFAULT_API_BASE: &str = "https://api.twilio.com";

#[derive(Clone)]
pub struct TwilioClient {
    client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("api_base", &self.api_base)
            .field("account_sid", &self.account_sid)
            .finish()
    }
}

/// Acceptance body for `POST .../Calls.json`.
#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
}

/// Error body Twilio returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u32>,
    message: Option<String>,
}

impl TwilioClient {
    pub fn new(account_sid: String, auth_token: String) -> Self {
        Self::with_api_base(DEFAULT_API_BASE.to_string(), account_sid, auth_token)
    }

    /// `api_base` is injectable so tests can point at a mock server.
    pub fn with_api_base(api_base: String, account_sid: String, auth_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client");

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
        }
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base, self.account_sid
        )
    }

    fn map_send_error(e: reqwest::Error) -> Error {
        Error::Provider {
            code: None,
            message: format!("request failed: {e}"),
        }
    }
}

#[async_trait]
impl DialPort for TwilioClient {
    async fn dial(&self, req: DialRequest) -> Result<CallHandle> {
        let timeout_secs = req.ring_timeout.as_secs().to_string();
        let params = [
            ("To", req.to.as_str()),
            ("From", req.from.as_str()),
            ("Url", req.answer_url.as_str()),
            ("Timeout", timeout_secs.as_str()),
        ];

        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or(ApiErrorBody {
                code: None,
                message: None,
            });
            return Err(Error::Provider {
                code: parsed.code,
                message: parsed
                    .message
                    .unwrap_or_else(|| format!("call rejected with status {status}")),
            });
        }

        let call: CallResource = response.json().await.map_err(|e| Error::Provider {
            code: None,
            message: format!("unparseable acceptance body: {e}"),
        })?;

        debug!(call = %call.sid, to = %req.to, "call accepted by provider");
        Ok(CallHandle(call.sid))
    }
}
