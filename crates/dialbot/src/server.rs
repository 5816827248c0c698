//! Webhook surface for the telephony provider (axum).
//!
//! Both endpoints are stateless: each request carries its correlation token
//! in the URL, and both always answer 200 with a well-formed voice script.
//! A failed response here would surface to the provider as a broken endpoint
//! and strand the call leg.

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use dialbot_core::{
    config::Config,
    domain::DigitCapture,
    voice::{session::CallSessionController, twiml::VoiceScript},
    Result,
};

#[derive(Clone)]
struct ServerState {
    sessions: Arc<CallSessionController>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Fields of interest from the provider's form-encoded callback body; the
/// rest of the payload is ignored.
#[derive(Debug, Default, Deserialize)]
struct CaptureForm {
    #[serde(rename = "Digits")]
    digits: Option<String>,
    #[serde(rename = "CallSid")]
    call_sid: Option<String>,
}

/// Voice-markup response body.
struct Twiml(VoiceScript);

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.0.to_xml()).into_response()
    }
}

// Extractors are optional so that even a mangled callback gets a 200 with a
// terminal script instead of an extractor rejection.
async fn handle_answer(
    State(state): State<ServerState>,
    query: Option<Query<TokenQuery>>,
) -> Twiml {
    let token = query.and_then(|Query(q)| q.token);
    Twiml(state.sessions.handle_answer(token.as_deref()))
}

async fn handle_capture(
    State(state): State<ServerState>,
    query: Option<Query<TokenQuery>>,
    form: Option<Form<CaptureForm>>,
) -> Twiml {
    let token = query.and_then(|Query(q)| q.token);
    let form = form.map(|Form(f)| f).unwrap_or_default();

    if let Some(sid) = &form.call_sid {
        info!(call = %sid, "capture callback");
    }

    let capture = DigitCapture {
        token,
        digits: form.digits.unwrap_or_default(),
    };
    Twiml(state.sessions.handle_capture(capture).await)
}

async fn handle_healthz() -> &'static str {
    "ok"
}

fn app(sessions: Arc<CallSessionController>) -> Router {
    Router::new()
        .route("/voice/answer", post(handle_answer))
        .route("/voice/capture", post(handle_capture))
        .route("/healthz", get(handle_healthz))
        .with_state(ServerState { sessions })
}

pub async fn run(cfg: Arc<Config>, sessions: Arc<CallSessionController>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port)).await?;
    info!("webhook server listening on port {}", cfg.port);

    axum::serve(listener, app(sessions))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
