pub mod anthropic;
pub mod error;
pub mod sse;

use crate::domain::conversation::ChatMessage;
use crate::llm::error::UpstreamError;
use futures_util::Stream;
use std::pin::Pin;

/// Incremental text fragments from a completion service, in order.
///
/// The sequence ends after the last fragment of a completed response; an
/// `Err` item means the response was cut short and nothing follows it.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Opens a streaming completion. Errors returned here happen before any
    /// fragment was produced (configuration, handshake, non-2xx status).
    async fn stream_completion(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<TextStream, UpstreamError>;
}

/// Stand-in used when no API key is configured; every call fails before streaming.
#[derive(Debug, Clone)]
pub struct Unconfigured {
    pub reason: String,
}

#[async_trait::async_trait]
impl CompletionProvider for Unconfigured {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    async fn stream_completion(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
    ) -> Result<TextStream, UpstreamError> {
        Err(UpstreamError::NotConfigured(self.reason.clone()))
    }
}
