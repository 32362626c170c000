use crate::{error_response, AppState};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{sse::Event, IntoResponse, Response, Sse},
};
use futures_util::StreamExt;
use patrimonio_core::advisor::parse_messages;
use uuid::Uuid;

pub async fn post_ai_advisor(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();

    let messages = match parse_messages(&body) {
        Ok(messages) => messages,
        Err(err) => {
            tracing::info!(%request_id, error = %err, "rejected advisor request");
            return error_response(StatusCode::BAD_REQUEST, err.public_message());
        }
    };

    let frames = match state.advisor.open(&messages).await {
        Ok(frames) => frames,
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(
                %request_id,
                provider = state.advisor.provider_name(),
                error = %err,
                "failed to open advisor stream"
            );
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process request");
        }
    };

    tracing::info!(
        %request_id,
        provider = state.advisor.provider_name(),
        turns = messages.len(),
        "advisor stream opened"
    );

    // An Err item aborts the response body, so the client never sees [DONE].
    let events = frames.map(|frame| frame.map(|f| Event::default().data(f.data())));
    Sse::new(events).into_response()
}
