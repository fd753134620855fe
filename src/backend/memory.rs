//! In-process backend for local development and tests.
//!
//! [`MemoryBackend`] implements all three backend seams on top of
//! `tokio::sync::RwLock`-guarded maps. It mimics the hosted service where
//! the site depends on it: generated ids and column defaults on insert,
//! nulls-last ordering, single-row reads that fail on zero or many rows,
//! GoTrue-style auth errors, and storage uploads that refuse to overwrite.
//!
//! Tests can make any table fail on demand with
//! [`MemoryBackend::fail_table`], count data calls with
//! [`MemoryBackend::data_calls`] and age every issued access token with
//! [`MemoryBackend::expire_sessions`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    AccessToken, AuthBackend, AuthUser, BackendError, DataBackend, Direction, RefreshToken, Row,
    Select, Session, SignUpOutcome, StorageBackend,
};
use crate::domain::RecordId;

/// Value a column takes when an insert omits it.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// A fixed JSON value.
    Value(Value),
    /// The current timestamp (RFC 3339).
    Now,
    /// The current date (`YYYY-MM-DD`).
    Today,
}

impl ColumnDefault {
    fn resolve(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Now => Value::String(Utc::now().to_rfc3339()),
            Self::Today => Value::String(Utc::now().date_naive().to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: AuthUser,
    password: String,
}

#[derive(Debug, Clone)]
struct IssuedToken {
    user: AuthUser,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Everything-in-memory implementation of [`DataBackend`],
/// [`AuthBackend`] and [`StorageBackend`].
#[derive(Debug)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<&'static str, Vec<Row>>>,
    defaults: HashMap<&'static str, Vec<(&'static str, ColumnDefault)>>,
    failures: RwLock<HashMap<&'static str, BackendError>>,
    users: RwLock<HashMap<String, StoredUser>>,
    sessions: RwLock<HashMap<String, IssuedToken>>,
    refresh_tokens: RwLock<HashMap<String, AuthUser>>,
    token_ttl: chrono::Duration,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    data_calls: AtomicUsize,
    require_confirmation: bool,
    public_base_url: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates an empty backend with no column defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            defaults: HashMap::new(),
            failures: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            refresh_tokens: RwLock::new(HashMap::new()),
            token_ttl: chrono::Duration::hours(1),
            objects: RwLock::new(HashMap::new()),
            data_calls: AtomicUsize::new(0),
            require_confirmation: false,
            public_base_url: "http://localhost:54321".to_string(),
        }
    }

    /// Creates a backend carrying the column defaults of the site's tables.
    #[must_use]
    pub fn with_site_schema() -> Self {
        let yes = || ColumnDefault::Value(Value::Bool(true));
        Self::new()
            .with_default("fuel_prices", "source", ColumnDefault::Value("manual".into()))
            .with_default("fuel_prices", "created_at", ColumnDefault::Now)
            .with_default("fuel_prices", "updated_at", ColumnDefault::Now)
            .with_default("job_listings", "is_active", yes())
            .with_default("job_listings", "created_at", ColumnDefault::Now)
            .with_default("news", "is_published", ColumnDefault::Value(Value::Bool(false)))
            .with_default("news", "published_date", ColumnDefault::Now)
            .with_default("news", "created_at", ColumnDefault::Now)
            .with_default("services", "is_active", yes())
            .with_default("services", "order_index", ColumnDefault::Value(0.into()))
            .with_default("team_members", "is_active", yes())
            .with_default("team_members", "order_index", ColumnDefault::Value(0.into()))
            .with_default("user_roles", "role", ColumnDefault::Value("user".into()))
    }

    /// Registers a default for `table.column`.
    #[must_use]
    pub fn with_default(
        mut self,
        table: &'static str,
        column: &'static str,
        default: ColumnDefault,
    ) -> Self {
        self.defaults
            .entry(table)
            .or_default()
            .push((column, default));
        self
    }

    /// Makes sign-up return [`SignUpOutcome::ConfirmationRequired`].
    #[must_use]
    pub fn requiring_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Sets how long issued access tokens stay valid.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Expires every access token issued so far. Refresh tokens stay valid.
    pub async fn expire_sessions(&self) {
        let past = Utc::now() - chrono::Duration::seconds(1);
        for issued in self.sessions.write().await.values_mut() {
            issued.expires_at = past;
        }
    }

    /// Makes every data call against `table` fail with `err` until
    /// [`MemoryBackend::clear_failures`] is called.
    pub async fn fail_table(&self, table: &'static str, err: BackendError) {
        self.failures.write().await.insert(table, err);
    }

    /// Removes all injected failures.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Number of data calls (select, insert, update, delete) served so far.
    #[must_use]
    pub fn data_calls(&self) -> usize {
        self.data_calls.load(AtomicOrdering::SeqCst)
    }

    /// Creates a confirmed account directly, bypassing sign-up.
    pub async fn register_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: uuid::Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        self.users.write().await.insert(
            email.to_lowercase(),
            StoredUser {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Inserts a `user_roles` row for `user_id`.
    pub async fn grant_role(&self, user_id: uuid::Uuid, role: &str) {
        let mut row = Row::new();
        row.insert("user_id".to_string(), Value::String(user_id.to_string()));
        row.insert("role".to_string(), Value::String(role.to_string()));
        self.tables
            .write()
            .await
            .entry("user_roles")
            .or_default()
            .push(row);
    }

    /// Returns the stored bytes and content type of `bucket/key`.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| (o.bytes.clone(), o.content_type.clone()))
    }

    async fn check(&self, table: &'static str) -> Result<(), BackendError> {
        self.data_calls.fetch_add(1, AtomicOrdering::SeqCst);
        match self.failures.read().await.get(table) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn matching(rows: &[Row], query: &Select) -> Vec<Row> {
        let mut out: Vec<Row> = rows
            .iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|f| row.get(f.column).unwrap_or(&Value::Null) == &f.value)
            })
            .cloned()
            .collect();

        if let Some(order) = query.order {
            out.sort_by(|a, b| {
                let lhs = a.get(order.column).unwrap_or(&Value::Null);
                let rhs = b.get(order.column).unwrap_or(&Value::Null);
                match order.direction {
                    Direction::Ascending => compare_values(lhs, rhs),
                    Direction::Descending => compare_values(rhs, lhs),
                }
            });
        }

        if let Some(limit) = query.limit {
            out.truncate(limit);
        }
        out
    }

    fn id_matches(row: &Row, id: RecordId) -> bool {
        row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
    }

    async fn issue_session(&self, user: AuthUser) -> Session {
        let access = format!("mem-{}", uuid::Uuid::new_v4());
        let refresh = format!("mem-r-{}", uuid::Uuid::new_v4());
        let expires_at = Utc::now() + self.token_ttl;
        self.refresh_tokens
            .write()
            .await
            .insert(refresh.clone(), user.clone());
        self.sessions.write().await.insert(
            access.clone(),
            IssuedToken {
                user: user.clone(),
                expires_at,
            },
        );
        Session {
            access_token: AccessToken::new(access),
            refresh_token: Some(RefreshToken::new(refresh)),
            expires_at: Some(expires_at),
            user,
        }
    }
}

/// Orders JSON values the way Postgres orders the underlying columns:
/// numbers numerically, strings lexically, `false < true`, nulls last.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn select(
        &self,
        _auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Vec<Row>, BackendError> {
        self.check(query.table).await?;
        let tables = self.tables.read().await;
        let rows = tables.get(query.table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Self::matching(rows, query))
    }

    async fn select_single(
        &self,
        auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Row, BackendError> {
        let mut rows = self.select(auth, query).await?;
        if rows.len() != 1 {
            return Err(BackendError::RowCount { found: rows.len() });
        }
        rows.pop().ok_or(BackendError::RowCount { found: 0 })
    }

    async fn insert(
        &self,
        _auth: Option<&AccessToken>,
        table: &'static str,
        mut values: Row,
    ) -> Result<Row, BackendError> {
        self.check(table).await?;
        values
            .entry("id")
            .or_insert_with(|| Value::String(RecordId::new().to_string()));
        if let Some(defaults) = self.defaults.get(table) {
            for (column, default) in defaults {
                values
                    .entry(column.to_string())
                    .or_insert_with(|| default.resolve());
            }
        }
        self.tables
            .write()
            .await
            .entry(table)
            .or_default()
            .push(values.clone());
        Ok(values)
    }

    async fn update(
        &self,
        _auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
        values: Row,
    ) -> Result<(), BackendError> {
        self.check(table).await?;
        let mut tables = self.tables.write().await;
        if let Some(row) = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| Self::id_matches(r, id)))
        {
            for (column, value) in values {
                row.insert(column, value);
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        _auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
    ) -> Result<(), BackendError> {
        self.check(table).await?;
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            rows.retain(|r| !Self::id_matches(r, id));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _redirect_to: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        if password.len() < 6 {
            return Err(BackendError::rejected(
                422,
                "Password should be at least 6 characters.",
            ));
        }
        if self.users.read().await.contains_key(&email.to_lowercase()) {
            return Err(BackendError::rejected(422, "User already registered"));
        }
        let user = self.register_user(email, password).await;
        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired(user));
        }
        Ok(SignUpOutcome::SignedIn(self.issue_session(user).await))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let user = match self.users.read().await.get(&email.to_lowercase()) {
            Some(stored) if stored.password == password => stored.user.clone(),
            _ => return Err(BackendError::rejected(400, "Invalid login credentials")),
        };
        Ok(self.issue_session(user).await)
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError> {
        if let Some(issued) = self.sessions.write().await.remove(token.as_str()) {
            self.refresh_tokens
                .write()
                .await
                .retain(|_, user| user.id != issued.user.id);
        }
        Ok(())
    }

    async fn user(&self, token: &AccessToken) -> Result<AuthUser, BackendError> {
        match self.sessions.read().await.get(token.as_str()) {
            Some(issued) if issued.expires_at > Utc::now() => Ok(issued.user.clone()),
            Some(_) => Err(BackendError::rejected(401, "JWT expired")),
            None => Err(BackendError::rejected(
                401,
                "invalid JWT: unable to parse or verify",
            )),
        }
    }

    async fn refresh(&self, token: &RefreshToken) -> Result<Session, BackendError> {
        let user = self
            .refresh_tokens
            .write()
            .await
            .remove(token.as_str())
            .ok_or_else(|| {
                BackendError::rejected(400, "Invalid Refresh Token: Refresh Token Not Found")
            })?;
        Ok(self.issue_session(user).await)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn upload(
        &self,
        _auth: Option<&AccessToken>,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let mut objects = self.objects.write().await;
        let slot = (bucket.to_string(), key.to_string());
        if objects.contains_key(&slot) {
            return Err(BackendError::rejected(409, "The resource already exists"));
        }
        objects.insert(
            slot,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{key}",
            self.public_base_url
        )
    }
}
