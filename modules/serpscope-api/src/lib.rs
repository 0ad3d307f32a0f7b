use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    response::Html,
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use serpscope_pipeline::Pipeline;

pub mod rest;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Web UI
        .route("/", get(index))
        // Health check
        .route("/health", get(|| async { "ok" }))
        // REST API
        .route("/api/analyze", post(rest::api_analyze))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Every analysis is a fresh run
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path only; topics stay out of the request span
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
