use crate::{error_response, AppState};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use patrimonio_core::datasets::load_cached_dataset;

pub async fn get_dataset(State(state): State<AppState>, Path(dataset): Path<String>) -> Response {
    let Some(spec) = state.datasets.get_by_slug(&dataset) else {
        return error_response(StatusCode::NOT_FOUND, "Unknown dataset");
    };

    let res = load_cached_dataset(spec, chrono::Utc::now()).await;
    tracing::debug!(
        dataset = %spec.id,
        source = ?res.source,
        stale = res.stale,
        "serving dataset"
    );

    let cache_control = format!("public, max-age={}", spec.revalidate.as_secs());
    let mut response = Json(res.body).into_response();
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}
