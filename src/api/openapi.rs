//! OpenAPI document for the JSON API.

use utoipa::OpenApi;

use super::dto::QuoteResponse;
use super::handlers::{content, system};
use crate::domain::quote::{FuelKind, QuoteRequest};
use crate::domain::{
    ContactInfo, FuelPrice, JobListing, NewsItem, RecordId, Service, SiteSettings, TeamMember,
};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI description of every `/api/v1` route and `/health`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "energies-site API",
        description = "Read-only content and quote endpoints of the fuel distribution site."
    ),
    paths(
        content::list_fuel_prices,
        content::list_services,
        content::list_team,
        content::list_news,
        content::list_jobs,
        content::get_contact,
        content::get_settings,
        content::quote,
        system::health_handler,
    ),
    components(schemas(
        RecordId,
        FuelPrice,
        Service,
        TeamMember,
        NewsItem,
        JobListing,
        ContactInfo,
        SiteSettings,
        FuelKind,
        QuoteRequest,
        QuoteResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Content", description = "Published site content"),
        (name = "Quote", description = "Fuel order estimates"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
