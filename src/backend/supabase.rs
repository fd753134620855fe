//! Hosted backend over HTTP: PostgREST tables, GoTrue auth, Storage.
//!
//! [`SupabaseClient`] is a thin `reqwest` wrapper. Each trait method maps to
//! exactly one HTTP request; error bodies are reduced to the service's own
//! message so it can be shown to the user verbatim.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::{Value, json};

use super::{
    AccessToken, AuthBackend, AuthUser, BackendError, DataBackend, Direction, RefreshToken, Row,
    Select, Session, SignUpOutcome, StorageBackend,
};
use crate::config::SupabaseSettings;
use crate::domain::RecordId;
use crate::error::SiteError;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// HTTP client for one Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl SupabaseClient {
    /// Builds a client for the project at `settings.url`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Internal`] if the URL does not parse or the
    /// HTTP client cannot be constructed.
    pub fn new(settings: &SupabaseSettings) -> Result<Self, SiteError> {
        let mut raw = settings.url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|e| SiteError::Internal(format!("invalid SUPABASE_URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| SiteError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base,
            anon_key: settings.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    fn request(&self, method: Method, url: Url, auth: Option<&AccessToken>) -> RequestBuilder {
        let bearer = auth.map_or(self.anon_key.as_str(), AccessToken::as_str);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn row_url(&self, table: &str, id: RecordId) -> Result<Url, BackendError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn select_url(&self, query: &Select) -> Result<Url, BackendError> {
        let mut url = self.table_url(query.table)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for filter in &query.filters {
                pairs.append_pair(filter.column, &format!("eq.{}", filter_literal(&filter.value)));
            }
            if let Some(order) = query.order {
                let dir = match order.direction {
                    Direction::Ascending => "asc",
                    Direction::Descending => "desc",
                };
                pairs.append_pair("order", &format!("{}.{dir}", order.column));
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    async fn auth_post(
        &self,
        path: &str,
        params: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, BackendError> {
        let mut url = self.endpoint(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        let resp = self
            .request(Method::POST, url, None)
            .json(body)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<Value>().await?)
    }
}

/// Renders a filter value the way PostgREST expects it after `eq.`.
fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Pulls the most specific human-readable message out of an error body.
///
/// PostgREST uses `message`; GoTrue uses `msg`, `error_description` or
/// `error`; Storage uses `message` or `error`.
fn error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    if body.trim().is_empty() {
        format!("request failed with status {status}")
    } else {
        body.trim().to_string()
    }
}

async fn ensure_success(resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body, status.as_u16());
    tracing::debug!(status = status.as_u16(), %message, "backend rejected request");
    Err(BackendError::rejected(status.as_u16(), message))
}

fn parse_user(value: &Value) -> Result<AuthUser, BackendError> {
    serde_json::from_value::<AuthUser>(value.clone()).map_err(BackendError::from)
}

fn parse_session(value: &Value) -> Result<Session, BackendError> {
    let token = value
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::Decode("missing access_token".to_string()))?;
    let user = value
        .get("user")
        .ok_or_else(|| BackendError::Decode("missing user".to_string()))?;
    let refresh_token = value
        .get("refresh_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(RefreshToken::new);
    Ok(Session {
        access_token: AccessToken::new(token),
        refresh_token,
        expires_at: expiry(value, Utc::now()),
        user: parse_user(user)?,
    })
}

/// GoTrue sends `expires_at` (unix seconds) and `expires_in` (seconds from
/// now). The absolute value wins when both are present.
fn expiry(value: &Value, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(at) = value.get("expires_at").and_then(Value::as_i64) {
        return DateTime::from_timestamp(at, 0);
    }
    value
        .get("expires_in")
        .and_then(Value::as_i64)
        .map(|secs| now + chrono::Duration::seconds(secs))
}

#[async_trait]
impl DataBackend for SupabaseClient {
    async fn select(
        &self,
        auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Vec<Row>, BackendError> {
        let url = self.select_url(query)?;
        let resp = self.request(Method::GET, url, auth).send().await?;
        Ok(ensure_success(resp).await?.json::<Vec<Row>>().await?)
    }

    async fn select_single(
        &self,
        auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Row, BackendError> {
        let url = self.select_url(query)?;
        let resp = self
            .request(Method::GET, url, auth)
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json::<Row>().await?)
    }

    async fn insert(
        &self,
        auth: Option<&AccessToken>,
        table: &'static str,
        values: Row,
    ) -> Result<Row, BackendError> {
        let url = self.table_url(table)?;
        let resp = self
            .request(Method::POST, url, auth)
            .header("Prefer", "return=representation")
            .json(&[Value::Object(values)])
            .send()
            .await?;
        let mut rows = ensure_success(resp).await?.json::<Vec<Row>>().await?;
        rows.pop()
            .ok_or(BackendError::RowCount { found: 0 })
    }

    async fn update(
        &self,
        auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
        values: Row,
    ) -> Result<(), BackendError> {
        let url = self.row_url(table, id)?;
        let resp = self
            .request(Method::PATCH, url, auth)
            .header("Prefer", "return=minimal")
            .json(&values)
            .send()
            .await?;
        ensure_success(resp).await.map(|_| ())
    }

    async fn delete(
        &self,
        auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
    ) -> Result<(), BackendError> {
        let url = self.row_url(table, id)?;
        let resp = self.request(Method::DELETE, url, auth).send().await?;
        ensure_success(resp).await.map(|_| ())
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        let body = self
            .auth_post(
                "auth/v1/signup",
                &[("redirect_to", redirect_to)],
                &json!({ "email": email, "password": password }),
            )
            .await?;
        // With email confirmation enabled GoTrue answers with the bare user.
        if body.get("access_token").is_some() {
            Ok(SignUpOutcome::SignedIn(parse_session(&body)?))
        } else {
            let user = body.get("user").unwrap_or(&body);
            Ok(SignUpOutcome::ConfirmationRequired(parse_user(user)?))
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let body = self
            .auth_post(
                "auth/v1/token",
                &[("grant_type", "password")],
                &json!({ "email": email, "password": password }),
            )
            .await?;
        parse_session(&body)
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;
        let resp = self.request(Method::POST, url, Some(token)).send().await?;
        ensure_success(resp).await.map(|_| ())
    }

    async fn user(&self, token: &AccessToken) -> Result<AuthUser, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let resp = self.request(Method::GET, url, Some(token)).send().await?;
        let body = ensure_success(resp).await?.json::<Value>().await?;
        parse_user(&body)
    }

    async fn refresh(&self, token: &RefreshToken) -> Result<Session, BackendError> {
        let body = self
            .auth_post(
                "auth/v1/token",
                &[("grant_type", "refresh_token")],
                &json!({ "refresh_token": token.as_str() }),
            )
            .await?;
        parse_session(&body)
    }
}

#[async_trait]
impl StorageBackend for SupabaseClient {
    async fn upload(
        &self,
        auth: Option<&AccessToken>,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("storage/v1/object/{bucket}/{key}"))?;
        let resp = self
            .request(Method::POST, url, auth)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        ensure_success(resp).await.map(|_| ())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}storage/v1/object/public/{bucket}/{key}",
            self.base.as_str()
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::backend::Order;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SupabaseClient {
        let settings = SupabaseSettings {
            url: server.uri(),
            anon_key: "anon-key".to_string(),
            timeout_secs: 5,
        };
        let Ok(client) = SupabaseClient::new(&settings) else {
            panic!("client construction failed");
        };
        client
    }

    #[tokio::test]
    async fn select_sends_order_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/news"))
            .and(query_param("select", "*"))
            .and(query_param("is_published", "eq.true"))
            .and(query_param("order", "published_date.desc"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "id": "1", "title": "Depot opens" }])),
            )
            .mount(&server)
            .await;

        let query = Select::from("news")
            .eq("is_published", true)
            .order(Order::desc("published_date"));
        let Ok(rows) = client(&server).select(None, &query).await else {
            panic!("select failed");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows.first().and_then(|r| r.get("title")),
            Some(&json!("Depot opens"))
        );
    }

    #[tokio::test]
    async fn rejected_request_keeps_postgrest_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/services"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"services\""
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .insert(Some(&AccessToken::new("user-jwt")), "services", Row::new())
            .await;
        let Err(err) = err else {
            panic!("expected rejection");
        };
        assert_eq!(
            err.to_string(),
            "new row violates row-level security policy for table \"services\""
        );
    }

    #[tokio::test]
    async fn user_token_replaces_anon_bearer() {
        let server = MockServer::start().await;
        let id = RecordId::new();
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/team_members"))
            .and(query_param("id", format!("eq.{id}").as_str()))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .delete(Some(&AccessToken::new("user-jwt")), "team_members", id)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn sign_in_parses_session() {
        let server = MockServer::start().await;
        let user_id = uuid::Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_json(json!({ "email": "a@b.tz", "password": "secret1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-1",
                "token_type": "bearer",
                "user": { "id": user_id, "email": "a@b.tz" }
            })))
            .mount(&server)
            .await;

        let Ok(session) = client(&server).sign_in("a@b.tz", "secret1").await else {
            panic!("sign in failed");
        };
        assert_eq!(session.access_token.as_str(), "jwt-1");
        assert_eq!(session.user.id, user_id);
        assert_eq!(session.refresh_token, None);
        assert_eq!(session.expires_at, None);
    }

    #[tokio::test]
    async fn refresh_exchanges_the_refresh_token() {
        let server = MockServer::start().await;
        let user_id = uuid::Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(header("apikey", "anon-key"))
            .and(body_json(json!({ "refresh_token": "refresh-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-2",
                "token_type": "bearer",
                "expires_in": 3600,
                "expires_at": 1_900_000_000,
                "refresh_token": "refresh-2",
                "user": { "id": user_id, "email": "a@b.tz" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let Ok(session) = client(&server)
            .refresh(&RefreshToken::new("refresh-1"))
            .await
        else {
            panic!("refresh failed");
        };
        assert_eq!(session.access_token.as_str(), "jwt-2");
        assert_eq!(session.refresh_token, Some(RefreshToken::new("refresh-2")));
        assert_eq!(session.expires_at, DateTime::from_timestamp(1_900_000_000, 0));
        assert_eq!(session.user.id, user_id);
    }

    #[tokio::test]
    async fn spent_refresh_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400,
                "error_code": "refresh_token_already_used",
                "msg": "Invalid Refresh Token: Already Used"
            })))
            .mount(&server)
            .await;

        let Err(err) = client(&server)
            .refresh(&RefreshToken::new("refresh-1"))
            .await
        else {
            panic!("expected rejection");
        };
        assert_eq!(err.to_string(), "Invalid Refresh Token: Already Used");
    }

    #[test]
    fn expiry_falls_back_to_expires_in() {
        let now = Utc::now();
        assert_eq!(
            expiry(&json!({ "expires_in": 60 }), now),
            Some(now + chrono::Duration::seconds(60))
        );
        assert_eq!(expiry(&json!({}), now), None);
    }

    #[tokio::test]
    async fn sign_up_without_session_requires_confirmation() {
        let server = MockServer::start().await;
        let user_id = uuid::Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(query_param("redirect_to", "http://localhost:3000/portal"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": user_id, "email": "new@b.tz" })),
            )
            .mount(&server)
            .await;

        let outcome = client(&server)
            .sign_up("new@b.tz", "secret1", "http://localhost:3000/portal")
            .await;
        let Ok(SignUpOutcome::ConfirmationRequired(user)) = outcome else {
            panic!("expected confirmation to be required");
        };
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn gotrue_error_description_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let Err(err) = client(&server).sign_in("a@b.tz", "wrong").await else {
            panic!("expected rejection");
        };
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn upload_posts_bytes_to_bucket_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/avatars/team/avatar-1700000000000.png"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server);
        let result = c
            .upload(
                None,
                "avatars",
                "team/avatar-1700000000000.png",
                vec![0x89, 0x50],
                "image/png",
            )
            .await;
        assert!(result.is_ok());
        assert_eq!(
            c.public_url("avatars", "team/avatar-1700000000000.png"),
            format!(
                "{}/storage/v1/object/public/avatars/team/avatar-1700000000000.png",
                server.uri()
            )
        );
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(error_message("", 502), "request failed with status 502");
        assert_eq!(error_message("upstream down", 502), "upstream down");
    }
}
