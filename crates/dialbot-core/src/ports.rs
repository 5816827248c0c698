use std::time::Duration;

use async_trait::async_trait;

use crate::{domain::CallHandle, Result};

/// Parameters for one outbound call placement.
#[derive(Clone, Debug)]
pub struct DialRequest {
    /// Destination number in `+<digits>` form.
    pub to: String,
    /// Source (caller id) number.
    pub from: String,
    /// Absolute URL the provider fetches for voice instructions once the
    /// callee answers. Carries the correlation token.
    pub answer_url: String,
    /// Maximum ring time before the provider gives up.
    pub ring_timeout: Duration,
}

/// Hexagonal port for the telephony provider's outbound-call API.
///
/// Twilio is the first implementation; the shape is provider-neutral so a
/// different voice API can fit behind the same interface.
#[async_trait]
pub trait DialPort: Send + Sync {
    /// Ask the provider to place the call. Returns its call identifier on
    /// acceptance; rejections surface as `Error::Provider`.
    async fn dial(&self, req: DialRequest) -> Result<CallHandle>;
}
