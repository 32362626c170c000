use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("completion provider is not configured: {0}")]
    NotConfigured(String),

    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream stream error ({kind}): {message}")]
    Stream { kind: String, message: String },

    #[error("malformed upstream event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no data from upstream within {0:?}")]
    IdleTimeout(Duration),
}
