//! Backend seam: data, auth and object storage.
//!
//! Everything the site persists lives in a hosted backend-as-a-service.
//! This module defines the three narrow traits the rest of the crate talks
//! to ([`DataBackend`], [`AuthBackend`], [`StorageBackend`]) and the
//! implementations behind them:
//!
//! - [`supabase`]: the hosted service over HTTP (PostgREST, GoTrue, Storage)
//! - [`postgres`]: direct table access through `sqlx::PgPool`
//! - [`memory`]: an in-process stand-in for local development and tests
//!
//! None of these layer caching, retries or transactions on top of the
//! underlying calls.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod supabase;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::BackendError;

use crate::config::{BackendMode, SiteConfig};
use crate::domain::RecordId;
use crate::error::SiteError;

/// A table row as the backend returns it: a JSON object keyed by column.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Bearer token identifying an authenticated user to the backend.
///
/// The `Debug` impl redacts the token so it never lands in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Long-lived token exchanged for a fresh [`Session`] once the access token
/// expires. Redacted in `Debug` like [`AccessToken`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(***)")
    }
}

/// Sort direction for an ordered read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordering clause: one column and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    /// Column to sort by.
    pub column: &'static str,
    /// Sort direction.
    pub direction: Direction,
}

impl Order {
    /// Ascending order on `column`.
    #[must_use]
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Ascending,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Descending,
        }
    }
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column to compare.
    pub column: &'static str,
    /// Value the column must equal.
    pub value: serde_json::Value,
}

/// A table-scoped read: `SELECT * FROM table WHERE .. ORDER BY .. LIMIT ..`.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Table to read from.
    pub table: &'static str,
    /// Equality filters, all of which must match.
    pub filters: Vec<Filter>,
    /// Optional ordering.
    pub order: Option<Order>,
    /// Optional row limit.
    pub limit: Option<usize>,
}

impl Select {
    /// Starts a read of every row in `table`.
    #[must_use]
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl Into<serde_json::Value>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Table-scoped data access.
///
/// `auth` carries the caller's token when the call is made on behalf of a
/// signed-in user; `None` means the anonymous (public) role.
#[async_trait]
pub trait DataBackend: fmt::Debug + Send + Sync {
    /// Returns every row matching `query`.
    async fn select(
        &self,
        auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Vec<Row>, BackendError>;

    /// Returns the single row matching `query`, failing when zero or
    /// several rows match.
    async fn select_single(
        &self,
        auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Row, BackendError>;

    /// Inserts one row and returns it as stored (with generated columns).
    async fn insert(
        &self,
        auth: Option<&AccessToken>,
        table: &'static str,
        values: Row,
    ) -> Result<Row, BackendError>;

    /// Updates the given columns of the row with primary key `id`.
    async fn update(
        &self,
        auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
        values: Row,
    ) -> Result<(), BackendError>;

    /// Deletes the row with primary key `id`.
    async fn delete(
        &self,
        auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
    ) -> Result<(), BackendError>;
}

/// Identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Backend-assigned user id.
    pub id: uuid::Uuid,
    /// Email address, when known.
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Token sent with every call made on the user's behalf.
    pub access_token: AccessToken,
    /// Token that renews the session; absent when the backend issued none.
    pub refresh_token: Option<RefreshToken>,
    /// When `access_token` stops being accepted, if known.
    pub expires_at: Option<DateTime<Utc>>,
    /// The signed-in user.
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token expires before `now + margin`. A session
    /// with no known expiry never needs renewing.
    #[must_use]
    pub fn expires_within(&self, margin: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now + margin)
    }
}

/// Result of a sign-up attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The backend signed the user in right away.
    SignedIn(Session),
    /// The account exists but the email address must be confirmed first.
    ConfirmationRequired(AuthUser),
}

/// Email/password authentication.
#[async_trait]
pub trait AuthBackend: fmt::Debug + Send + Sync {
    /// Registers a new account. `redirect_to` is where the confirmation
    /// email sends the user.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, BackendError>;

    /// Exchanges credentials for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    /// Revokes the session behind `token`.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError>;

    /// Resolves the user behind `token` (session retrieval).
    async fn user(&self, token: &AccessToken) -> Result<AuthUser, BackendError>;

    /// Exchanges a refresh token for a new session. The old refresh token
    /// is spent.
    async fn refresh(&self, token: &RefreshToken) -> Result<Session, BackendError>;
}

/// Object storage for uploaded assets.
#[async_trait]
pub trait StorageBackend: fmt::Debug + Send + Sync {
    /// Stores `bytes` under `bucket/key`.
    async fn upload(
        &self,
        auth: Option<&AccessToken>,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;

    /// Publicly resolvable URL of `bucket/key`. Pure: does not check that
    /// the object exists.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// The three backend seams bundled for injection into services.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Table access.
    pub data: Arc<dyn DataBackend>,
    /// Authentication.
    pub auth: Arc<dyn AuthBackend>,
    /// Object storage.
    pub storage: Arc<dyn StorageBackend>,
}

impl Backends {
    /// Uses one in-memory backend for all three seams.
    #[must_use]
    pub fn in_memory(backend: Arc<memory::MemoryBackend>) -> Self {
        Self {
            data: Arc::clone(&backend) as Arc<dyn DataBackend>,
            auth: Arc::clone(&backend) as Arc<dyn AuthBackend>,
            storage: backend,
        }
    }

    /// Builds the backends selected by `config.backend_mode`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Internal`] when the hosted service credentials
    /// are missing, the HTTP client cannot be built, or the database pool
    /// cannot connect.
    pub async fn connect(config: &SiteConfig) -> Result<Self, SiteError> {
        if config.backend_mode == BackendMode::Memory {
            tracing::warn!("using the in-memory backend; content is lost on restart");
            return Ok(Self::in_memory(Arc::new(
                memory::MemoryBackend::with_site_schema(),
            )));
        }

        let Some(settings) = config.supabase.as_ref() else {
            return Err(SiteError::Internal(
                "SUPABASE_URL and SUPABASE_ANON_KEY must be set".to_string(),
            ));
        };
        let client = Arc::new(supabase::SupabaseClient::new(settings)?);

        let data: Arc<dyn DataBackend> = if config.backend_mode == BackendMode::Postgres {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .min_connections(config.database_min_connections)
                .acquire_timeout(std::time::Duration::from_secs(
                    config.database_connect_timeout_secs,
                ))
                .connect(&config.database_url)
                .await
                .map_err(|e| SiteError::Internal(format!("database connect failed: {e}")))?;
            tracing::info!("data backend: postgres");
            Arc::new(postgres::PostgresBackend::new(pool))
        } else {
            tracing::info!(url = %settings.url, "data backend: supabase");
            Arc::clone(&client) as Arc<dyn DataBackend>
        };

        Ok(Self {
            data,
            auth: Arc::clone(&client) as Arc<dyn AuthBackend>,
            storage: client,
        })
    }
}
