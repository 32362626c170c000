use crate::{error_response, AppState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use patrimonio_core::site;

pub async fn get_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match site::find_page(&slug) {
        Some(page) => Json(site::page_metadata(&state.site_base_url, page)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Unknown page"),
    }
}

pub async fn sitemap(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        site::render_sitemap(&state.site_base_url, state.started_on),
    )
        .into_response()
}

pub async fn robots(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        site::render_robots(&state.site_base_url),
    )
        .into_response()
}
