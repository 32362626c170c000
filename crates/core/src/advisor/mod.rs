pub mod persona;

use crate::domain::conversation::ChatMessage;
use crate::llm::error::UpstreamError;
use crate::llm::{CompletionProvider, TextStream};
use futures_util::{stream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;

pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Messages array is required")]
    MessagesRequired,

    #[error("Invalid message format")]
    InvalidMessage,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl AdvisorError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AdvisorError::Upstream(_))
    }

    /// Message safe to hand back to the caller; upstream detail stays in logs.
    pub fn public_message(&self) -> String {
        match self {
            AdvisorError::Upstream(_) => "Failed to process request".to_string(),
            other => other.to_string(),
        }
    }
}

/// Validate a raw request body into the conversation history.
///
/// Anything other than an object holding a non-empty `messages` array is
/// rejected before the completion service is contacted.
pub fn parse_messages(body: &[u8]) -> Result<Vec<ChatMessage>, AdvisorError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| AdvisorError::MessagesRequired)?;
    let Some(Value::Array(items)) = value.get("messages") else {
        return Err(AdvisorError::MessagesRequired);
    };
    if items.is_empty() {
        return Err(AdvisorError::MessagesRequired);
    }

    items
        .iter()
        .map(|item| ChatMessage::deserialize(item).map_err(|_| AdvisorError::InvalidMessage))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    Text(String),
    Done,
}

impl RelayFrame {
    /// Payload of the `data:` line for this frame.
    pub fn data(&self) -> String {
        match self {
            RelayFrame::Text(text) => serde_json::json!({ "text": text }).to_string(),
            RelayFrame::Done => DONE_SENTINEL.to_string(),
        }
    }
}

pub type RelayStream = Pin<Box<dyn Stream<Item = Result<RelayFrame, UpstreamError>> + Send>>;

/// Re-emit upstream fragments one frame each, then the sentinel.
///
/// An upstream error, or no fragment within `idle_timeout`, ends the sequence
/// with that error and no sentinel. Dropping the returned stream drops the
/// upstream one with it.
pub fn relay(upstream: TextStream, idle_timeout: Duration) -> RelayStream {
    Box::pin(stream::unfold(Some(upstream), move |state| async move {
        let mut upstream = state?;
        match tokio::time::timeout(idle_timeout, upstream.next()).await {
            Ok(Some(Ok(text))) => Some((Ok(RelayFrame::Text(text)), Some(upstream))),
            Ok(Some(Err(err))) => {
                tracing::warn!(error = %err, "upstream stream failed; aborting relay");
                Some((Err(err), None))
            }
            Ok(None) => Some((Ok(RelayFrame::Done), None)),
            Err(_) => {
                tracing::warn!(?idle_timeout, "upstream stream idle; aborting relay");
                Some((Err(UpstreamError::IdleTimeout(idle_timeout)), None))
            }
        }
    }))
}

#[derive(Clone)]
pub struct Advisor {
    provider: Arc<dyn CompletionProvider>,
    system_prompt: String,
    idle_timeout: Duration,
}

impl Advisor {
    pub fn new(provider: Arc<dyn CompletionProvider>, idle_timeout: Duration) -> Self {
        Self {
            provider,
            system_prompt: persona::system_prompt(),
            idle_timeout,
        }
    }

    pub fn from_env(provider: Arc<dyn CompletionProvider>) -> Self {
        let idle_timeout_secs = std::env::var("ADVISOR_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);
        Self::new(provider, Duration::from_secs(idle_timeout_secs))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Open the upstream completion and return the frame stream. Failing here
    /// means nothing has been sent to the caller yet.
    pub async fn open(&self, messages: &[ChatMessage]) -> Result<RelayStream, AdvisorError> {
        let upstream = self
            .provider
            .stream_completion(&self.system_prompt, messages)
            .await?;
        Ok(relay(upstream, self.idle_timeout))
    }
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advisor")
            .field("provider", &self.provider.name())
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
