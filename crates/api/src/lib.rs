use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use patrimonio_core::advisor::Advisor;
use patrimonio_core::datasets::DatasetRegistry;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod routes;

#[derive(Debug, Clone)]
pub struct AppState {
    pub datasets: Arc<DatasetRegistry>,
    pub advisor: Arc<Advisor>,
    pub site_base_url: Arc<str>,
    pub started_on: chrono::NaiveDate,
}

impl AppState {
    pub fn new(datasets: DatasetRegistry, advisor: Advisor, site_base_url: &str) -> Self {
        Self {
            datasets: Arc::new(datasets),
            advisor: Arc::new(advisor),
            site_base_url: Arc::from(site_base_url),
            started_on: chrono::Utc::now().date_naive(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/data/:dataset", get(routes::data::get_dataset))
        .route("/api/ai-advisor", post(routes::advisor::post_ai_advisor))
        .route("/api/pages/:slug", get(routes::site::get_page))
        .route("/sitemap.xml", get(routes::site::sitemap))
        .route("/robots.txt", get(routes::site::robots))
        .route(
            "/api/strumenti/interesse-composto",
            post(routes::strumenti::post_interesse_composto),
        )
        .route("/api/strumenti/mutuo", post(routes::strumenti::post_mutuo))
        .route("/api/strumenti/irpef", post(routes::strumenti::post_irpef))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}
