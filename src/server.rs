//! Router assembly and middleware stack.

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;
use crate::{api, web};

/// Builds the complete application: pages, JSON API, change feed and the
/// not-found fallback, wrapped in tracing, CORS and a request timeout.
pub fn build_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    Router::new()
        .merge(web::routes())
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .fallback(web::pages::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(request_timeout(timeout))
        .with_state(state)
}

/// Abandons requests running longer than `timeout` with `408 Request Timeout`.
fn request_timeout(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
