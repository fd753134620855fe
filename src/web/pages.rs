//! Public marketing pages.
//!
//! Content sections degrade to empty lists (or fallback copy) when the
//! backend is unreachable; a page never fails because a table did.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Form;
use axum::response::{Html, IntoResponse};
use serde::Serialize;

use super::views::{AboutView, Branding, HomeView, Page, ServiceCard, TeamCard};
use crate::app_state::AppState;
use crate::domain::quote::{QuoteEstimate, QuoteRequest};
use crate::domain::{
    ContactInfo, ContactMessage, FuelPrice, JobListing, NewsItem, Resource, Service,
    SiteSettings, TeamMember,
};
use crate::error::SiteError;

/// Header and footer branding, with defaults when the row is unavailable.
pub(crate) async fn branding(state: &AppState) -> Branding {
    match state.content.table::<SiteSettings>().fetch_single(None).await {
        Ok(settings) => settings.into(),
        Err(err) => {
            tracing::warn!(error = %err, "site settings unavailable, using defaults");
            SiteSettings::fallback().into()
        }
    }
}

async fn visible<R: Resource>(state: &AppState) -> Vec<R> {
    state
        .content
        .table::<R>()
        .list_visible(None)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(table = R::TABLE, error = %err, "public listing failed");
            Vec::new()
        })
}

async fn render<T: Serialize>(
    state: &AppState,
    template: &str,
    nav: &'static str,
    body: T,
) -> Result<Html<String>, SiteError> {
    let page = Page::new(branding(state).await, nav, body);
    state.templates.render(template, &page)
}

/// `GET /`
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, SiteError> {
    let prices = visible::<FuelPrice>(&state).await;
    let news = visible::<NewsItem>(&state).await;
    render(&state, "home.html", "home", HomeView::new(prices, news)).await
}

/// `GET /about`
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn about(State(state): State<AppState>) -> Result<Html<String>, SiteError> {
    let body = AboutView {
        team: visible::<TeamMember>(&state)
            .await
            .into_iter()
            .map(TeamCard::from)
            .collect(),
        jobs: visible::<JobListing>(&state)
            .await
            .into_iter()
            .map(Into::into)
            .collect(),
    };
    render(&state, "about.html", "about", body).await
}

#[derive(Debug, Serialize)]
struct ServicesView {
    services: Vec<ServiceCard>,
}

/// `GET /services`
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn services(State(state): State<AppState>) -> Result<Html<String>, SiteError> {
    let services = visible::<Service>(&state)
        .await
        .into_iter()
        .map(ServiceCard::from)
        .collect();
    render(&state, "services.html", "services", ServicesView { services }).await
}

/// `GET /industries`
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn industries(State(state): State<AppState>) -> Result<Html<String>, SiteError> {
    render(&state, "industries.html", "industries", ()).await
}

#[derive(Debug, Serialize)]
struct ContactView {
    info: ContactInfo,
    form: ContactMessage,
    error: Option<String>,
    sent: bool,
}

async fn contact_info(state: &AppState) -> ContactInfo {
    match state.content.table::<ContactInfo>().fetch_single(None).await {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!(error = %err, "contact info unavailable, using defaults");
            ContactInfo::fallback()
        }
    }
}

/// `GET /contact`
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn contact(State(state): State<AppState>) -> Result<Html<String>, SiteError> {
    let body = ContactView {
        info: contact_info(&state).await,
        form: ContactMessage::default(),
        error: None,
        sent: false,
    };
    render(&state, "contact.html", "contact", body).await
}

/// `POST /contact`: validates and logs the message, then acknowledges it.
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render. Invalid
/// input re-renders the form with status 400.
pub async fn send_message(
    State(state): State<AppState>,
    Form(message): Form<ContactMessage>,
) -> Result<impl IntoResponse, SiteError> {
    let info = contact_info(&state).await;
    let (status, body) = match message.validate() {
        Ok(()) => {
            tracing::info!(
                name = %message.name,
                email = %message.email,
                phone = %message.phone,
                subject = %message.subject,
                length = message.message.len(),
                "contact message received"
            );
            (
                StatusCode::OK,
                ContactView {
                    info,
                    form: ContactMessage::default(),
                    error: None,
                    sent: true,
                },
            )
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            ContactView {
                info,
                form: message,
                error: Some(err.to_string()),
                sent: false,
            },
        ),
    };
    Ok((status, render(&state, "contact.html", "contact", body).await?))
}

#[derive(Debug, Serialize)]
struct QuoteView {
    form: QuoteRequest,
    estimate: Option<QuoteEstimate>,
    error: Option<String>,
}

/// `GET /quote`
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn quote(State(state): State<AppState>) -> Result<Html<String>, SiteError> {
    let body = QuoteView {
        form: QuoteRequest::default(),
        estimate: None,
        error: None,
    };
    render(&state, "quote.html", "quote", body).await
}

/// `POST /quote`: renders the estimate under the submitted form.
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render. Invalid
/// input re-renders the form with status 400.
pub async fn request_quote(
    State(state): State<AppState>,
    Form(request): Form<QuoteRequest>,
) -> Result<impl IntoResponse, SiteError> {
    let (status, estimate, error) = match request.estimate() {
        Ok(estimate) => {
            tracing::info!(
                company = %request.company_name,
                fuel = %estimate.fuel_kind,
                quantity = estimate.quantity,
                total = estimate.total,
                "quote requested"
            );
            (StatusCode::OK, Some(estimate), None)
        }
        Err(err) => (StatusCode::BAD_REQUEST, None, Some(err.to_string())),
    };
    let body = QuoteView {
        form: request,
        estimate,
        error,
    };
    Ok((status, render(&state, "quote.html", "quote", body).await?))
}

/// Fallback for unknown paths.
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn not_found(State(state): State<AppState>) -> Result<impl IntoResponse, SiteError> {
    Ok((
        StatusCode::NOT_FOUND,
        render(&state, "not_found.html", "", ()).await?,
    ))
}
