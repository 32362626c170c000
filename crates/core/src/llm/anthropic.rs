use crate::config::Settings;
use crate::domain::conversation::ChatMessage;
use crate::llm::error::UpstreamError;
use crate::llm::sse::{SseDecoder, SseEvent};
use crate::llm::{CompletionProvider, TextStream};
use anyhow::Context;
use futures_util::{stream, Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// Error bodies are logged, not returned to clients; cap what we keep.
const MAX_ERROR_BODY_CHARS: usize = 2000;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let connect_timeout_secs = std::env::var("ANTHROPIC_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        // No overall request timeout: a long answer is a long-lived response.
        // Stalls are caught by the relay's idle timeout instead.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    fn headers(&self) -> Result<HeaderMap, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| UpstreamError::InvalidRequest("API key is not a valid header value".to_string()))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        Ok(headers)
    }

    fn request<'a>(&'a self, system_prompt: &'a str, messages: &'a [ChatMessage]) -> CreateMessageRequest<'a> {
        CreateMessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages: messages
                .iter()
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: true,
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn stream_completion(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<TextStream, UpstreamError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&self.request(system_prompt, messages))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(text_deltas(res.bytes_stream()))
    }
}

struct DeltaState<S> {
    inner: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, UpstreamError>>,
    stopped: bool,
    finished: bool,
}

/// Turn a raw Messages API event-stream body into its text deltas.
///
/// A body that ends without `message_stop` is reported as an error so callers
/// never mistake a truncated answer for a complete one.
pub fn text_deltas<S, B, E>(inner: S) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<UpstreamError> + Send + 'static,
{
    let state = DeltaState {
        inner: Box::pin(inner),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        stopped: false,
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                if item.is_err() {
                    st.pending.clear();
                    st.finished = true;
                }
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    for event in st.decoder.push(chunk.as_ref()) {
                        match classify(&event) {
                            Ok(Delta::Text(text)) => st.pending.push_back(Ok(text)),
                            Ok(Delta::Skip) => {}
                            Ok(Delta::Stop) => {
                                st.stopped = true;
                                st.finished = true;
                                break;
                            }
                            Err(err) => {
                                st.pending.push_back(Err(err));
                                break;
                            }
                        }
                    }
                }
                Some(Err(err)) => {
                    st.finished = true;
                    return Some((Err(err.into()), st));
                }
                None => {
                    st.finished = true;
                    if !st.stopped {
                        let err = UpstreamError::Stream {
                            kind: "eof".to_string(),
                            message: "upstream closed before message_stop".to_string(),
                        };
                        return Some((Err(err), st));
                    }
                }
            }
        }
    }))
}

enum Delta {
    Text(String),
    Skip,
    Stop,
}

fn classify(event: &SseEvent) -> Result<Delta, UpstreamError> {
    if event.data.is_empty() {
        return Ok(Delta::Skip);
    }

    match serde_json::from_str::<StreamEvent>(&event.data)? {
        StreamEvent::ContentBlockDelta {
            delta: ContentDelta::TextDelta { text },
        } if !text.is_empty() => Ok(Delta::Text(text)),
        StreamEvent::MessageStop => Ok(Delta::Stop),
        StreamEvent::Error { error } => Err(UpstreamError::Stream {
            kind: error.kind,
            message: error.message,
        }),
        _ => Ok(Delta::Skip),
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum StreamEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: ContentDelta },

    #[serde(rename = "message_stop")]
    MessageStop,

    #[serde(rename = "error")]
    Error { error: ApiError },

    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentDelta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },

    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ChatMessage;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, UpstreamError>> + Send + 'static {
        let owned: Vec<Result<Vec<u8>, UpstreamError>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    const START: &str = "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n";
    const STOP: &str = "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n";

    fn delta(text: &str) -> String {
        format!(
            "event: content_block_delta\ndata: {}\n\n",
            serde_json::json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": text}})
        )
    }

    #[tokio::test]
    async fn yields_text_deltas_in_order() {
        let d1 = delta("Buon");
        let d2 = delta("giorno");
        let body = [START, d1.as_str(), "event: ping\ndata: {\"type\":\"ping\"}\n\n", d2.as_str(), STOP];
        let out: Vec<_> = text_deltas(chunks(&body)).collect().await;
        let texts: Vec<String> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(texts, vec!["Buon", "giorno"]);
    }

    #[tokio::test]
    async fn delta_split_across_chunks_is_reassembled() {
        let d = delta("ciao");
        let (a, b) = d.split_at(20);
        let out: Vec<_> = text_deltas(chunks(&[START, a, b, STOP])).collect().await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), "ciao");
    }

    #[tokio::test]
    async fn error_event_ends_stream_with_error() {
        let d = delta("parz");
        let err = "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n";
        let out: Vec<_> = text_deltas(chunks(&[START, d.as_str(), err, STOP])).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        match &out[1] {
            Err(UpstreamError::Stream { kind, .. }) => assert_eq!(kind, "overloaded_error"),
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn body_without_message_stop_is_truncated() {
        let d = delta("a metà");
        let out: Vec<_> = text_deltas(chunks(&[START, d.as_str()])).collect().await;
        assert_eq!(out.len(), 2);
        assert!(matches!(out[1], Err(UpstreamError::Stream { .. })));
    }

    #[tokio::test]
    async fn transport_error_is_forwarded() {
        let items: Vec<Result<Vec<u8>, UpstreamError>> = vec![
            Ok(delta("x").into_bytes()),
            Err(UpstreamError::Stream {
                kind: "io".to_string(),
                message: "reset".to_string(),
            }),
            Ok(STOP.as_bytes().to_vec()),
        ];
        let out: Vec<_> = text_deltas(stream::iter(items)).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out[1].is_err());
    }

    #[test]
    fn request_carries_system_prompt_and_history() {
        let client = AnthropicClient {
            http: reqwest::Client::new(),
            api_key: "k".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "m".to_string(),
            max_tokens: 64,
        };
        let history = vec![ChatMessage::user("ciao"), ChatMessage::assistant("Salve!")];
        let v = serde_json::to_value(client.request("persona", &history)).unwrap();
        assert_eq!(v["system"], "persona");
        assert_eq!(v["stream"], true);
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][1]["content"], "Salve!");
    }
}
