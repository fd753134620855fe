//! Server-rendered HTML: the public marketing pages and the portal.

pub mod pages;
pub mod portal;
pub mod templates;
pub mod views;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::app_state::AppState;

/// Builds the page router. The not-found fallback is attached by the
/// caller so it also covers the API and feed routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/services", get(pages::services))
        .route("/industries", get(pages::industries))
        .route("/contact", get(pages::contact).post(pages::send_message))
        .route("/quote", get(pages::quote).post(pages::request_quote))
        .route("/portal", get(portal::portal_page))
        .route("/portal/sign-in", post(portal::sign_in))
        .route("/portal/sign-up", post(portal::sign_up))
        .route("/portal/sign-out", post(portal::sign_out))
        .route("/portal/admin/{tab}", post(portal::admin_action))
        .route(
            "/portal/admin/{tab}/upload",
            post(portal::upload).layer(DefaultBodyLimit::max(portal::UPLOAD_LIMIT)),
        )
}
