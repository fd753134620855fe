//! Site error types with HTTP status code mapping.
//!
//! [`SiteError`] is the central error type. The taxonomy is deliberately
//! flat: a failure either came from the backend ([`SiteError::Backend`],
//! carrying the backend's own message) or was caught before anything was
//! sent ([`SiteError::Validation`]). The remaining variants cover routing
//! and access control.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::backend::BackendError;

/// Structured JSON error response body.
///
/// All API error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "Title is required"
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`SiteError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                  |
/// |-----------|------------------|------------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request              |
/// | 2000–2999 | Access/Not Found | 401 / 403 / 404              |
/// | 3000–3999 | Server/Backend   | 500 / 502                    |
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// A form or request failed client-side validation.
    #[error("{0}")]
    Validation(String),

    /// The addressed page or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// No valid session accompanies the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The session is valid but lacks the administrator role.
    #[error("administrator access required")]
    Forbidden,

    /// The backend rejected or failed the request. Displays the backend's
    /// message unchanged.
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// A page template failed to render.
    #[error("template error: {0}")]
    Template(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SiteError {
    /// Shorthand for a [`SiteError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::NotFound(_) => 2001,
            Self::Unauthorized(_) => 2002,
            Self::Forbidden => 2003,
            Self::Internal(_) => 3000,
            Self::Backend(_) => 3001,
            Self::Template(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Template(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tera::Error> for SiteError {
    fn from(err: tera::Error) -> Self {
        // Tera nests the useful part (missing variable, bad filter) in the
        // source chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template(message)
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
