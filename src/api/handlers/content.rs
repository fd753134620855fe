//! Read-only content endpoints and the quote calculator.
//!
//! Listings return only publicly visible rows, in display order. No
//! endpoint here mutates content; that happens through the portal.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::QuoteResponse;
use crate::app_state::AppState;
use crate::domain::quote::QuoteRequest;
use crate::domain::{
    ContactInfo, FuelPrice, JobListing, NewsItem, Resource, Service, SiteSettings, TeamMember,
};
use crate::error::{ErrorResponse, SiteError};

async fn visible<R: Resource>(state: &AppState) -> Result<Json<Vec<R>>, SiteError> {
    Ok(Json(state.content.table::<R>().list_visible(None).await?))
}

/// `GET /fuel-prices`: Current fuel prices.
///
/// # Errors
///
/// Returns [`SiteError::Backend`] when the listing fails.
#[utoipa::path(
    get,
    path = "/api/v1/fuel-prices",
    tag = "Content",
    summary = "List fuel prices",
    description = "All fuel prices ordered by fuel type.",
    responses(
        (status = 200, description = "Fuel prices", body = Vec<FuelPrice>),
        (status = 502, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn list_fuel_prices(
    State(state): State<AppState>,
) -> Result<Json<Vec<FuelPrice>>, SiteError> {
    visible(&state).await
}

/// `GET /services`: Active services.
///
/// # Errors
///
/// Returns [`SiteError::Backend`] when the listing fails.
#[utoipa::path(
    get,
    path = "/api/v1/services",
    tag = "Content",
    summary = "List services",
    description = "Active services ordered by `order_index`.",
    responses(
        (status = 200, description = "Services", body = Vec<Service>),
        (status = 502, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>, SiteError> {
    visible(&state).await
}

/// `GET /team`: Active team members.
///
/// # Errors
///
/// Returns [`SiteError::Backend`] when the listing fails.
#[utoipa::path(
    get,
    path = "/api/v1/team",
    tag = "Content",
    summary = "List team members",
    description = "Active team members ordered by `order_index`.",
    responses(
        (status = 200, description = "Team members", body = Vec<TeamMember>),
        (status = 502, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn list_team(State(state): State<AppState>) -> Result<Json<Vec<TeamMember>>, SiteError> {
    visible(&state).await
}

/// `GET /news`: Published news.
///
/// # Errors
///
/// Returns [`SiteError::Backend`] when the listing fails.
#[utoipa::path(
    get,
    path = "/api/v1/news",
    tag = "Content",
    summary = "List news",
    description = "Published news, newest first.",
    responses(
        (status = 200, description = "News posts", body = Vec<NewsItem>),
        (status = 502, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn list_news(State(state): State<AppState>) -> Result<Json<Vec<NewsItem>>, SiteError> {
    visible(&state).await
}

/// `GET /jobs`: Open positions.
///
/// # Errors
///
/// Returns [`SiteError::Backend`] when the listing fails.
#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    tag = "Content",
    summary = "List job listings",
    description = "Active job listings, newest first.",
    responses(
        (status = 200, description = "Job listings", body = Vec<JobListing>),
        (status = 502, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobListing>>, SiteError> {
    visible(&state).await
}

/// `GET /contact`: Company contact details.
///
/// # Errors
///
/// Returns [`SiteError::Backend`] when the row is missing or duplicated.
#[utoipa::path(
    get,
    path = "/api/v1/contact",
    tag = "Content",
    summary = "Get contact info",
    responses(
        (status = 200, description = "Contact info", body = ContactInfo),
        (status = 502, description = "Backend failure or not exactly one row", body = ErrorResponse),
    )
)]
pub async fn get_contact(State(state): State<AppState>) -> Result<Json<ContactInfo>, SiteError> {
    Ok(Json(state.content.table::<ContactInfo>().fetch_single(None).await?))
}

/// `GET /settings`: Site branding.
///
/// # Errors
///
/// Returns [`SiteError::Backend`] when the row is missing or duplicated.
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    tag = "Content",
    summary = "Get site settings",
    responses(
        (status = 200, description = "Site settings", body = SiteSettings),
        (status = 502, description = "Backend failure or not exactly one row", body = ErrorResponse),
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SiteSettings>, SiteError> {
    Ok(Json(state.content.table::<SiteSettings>().fetch_single(None).await?))
}

/// `POST /quote`: Estimate a bulk fuel order.
///
/// # Errors
///
/// Returns [`SiteError::Validation`] for a missing field or unknown fuel.
#[utoipa::path(
    post,
    path = "/api/v1/quote",
    tag = "Quote",
    summary = "Estimate a fuel order",
    description = "Unit price times quantity. Quantity is read like an integer prefix; non-numeric input estimates to 0.",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Estimate", body = QuoteResponse),
        (status = 400, description = "Missing field or unknown fuel type", body = ErrorResponse),
    )
)]
pub async fn quote(Json(request): Json<QuoteRequest>) -> Result<Json<QuoteResponse>, SiteError> {
    Ok(Json(request.estimate()?.into()))
}

/// Content routes, nested under `/api/v1` by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fuel-prices", get(list_fuel_prices))
        .route("/services", get(list_services))
        .route("/team", get(list_team))
        .route("/news", get(list_news))
        .route("/jobs", get(list_jobs))
        .route("/contact", get(get_contact))
        .route("/settings", get(get_settings))
        .route("/quote", post(quote))
}
