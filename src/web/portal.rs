//! The client portal: sign-in, the regular dashboard and the admin
//! workspace.
//!
//! A request finds its [`SessionHolder`](crate::service::SessionHolder)
//! through the `portal_session` cookie. Holders are only created for
//! sign-in and sign-up posts or to restore stored tokens, so a plain visit
//! leaves nothing behind. An anonymous holder lives just long enough to
//! carry a flash to the next page render, and sign-out removes the holder
//! outright.
//!
//! Each request drains pending auth events, renews the access token when it
//! is close to expiry, and holds the holder's write lock for the rest of
//! the request. Mutating requests answer with `303 See Other` back to
//! `/portal`; notices survive the redirect inside the managers or the
//! holder's flash.

use std::collections::HashMap;

use axum::Form;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::pages::branding;
use super::views::{Page, PanelView, PortalBody, PortalView, tabs, upload_category};
use crate::app_state::AppState;
use crate::backend::{AccessToken, RefreshToken, Session, SignUpOutcome};
use crate::domain::{FormFields, RecordId, SessionKey};
use crate::error::SiteError;
use crate::service::{AdminAction, AuthState, Notice, SessionHolder, SharedHolder, WorkspaceTab};

/// Cookie holding the portal session key.
pub const SESSION_COOKIE: &str = "portal_session";

/// Cookie holding the backend access token, used to restore a session the
/// server no longer holds.
pub const TOKEN_COOKIE: &str = "sb-access-token";

/// Cookie holding the backend refresh token.
pub const REFRESH_COOKIE: &str = "sb-refresh-token";

/// Largest accepted upload request.
pub const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

const SIGNED_OUT: &str = "/portal?status=signed-out";

fn read_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

fn set_cookie(name: &'static str, value: String) -> Result<HeaderValue, SiteError> {
    let cookie = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| SiteError::Internal(format!("invalid cookie header: {e}")))
}

fn clear_cookie(name: &'static str) -> Result<HeaderValue, SiteError> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| SiteError::Internal(format!("invalid cookie header: {e}")))
}

/// Stores both tokens of `session`. A session without a refresh token
/// clears any stale one.
fn store_tokens(session: &Session, cookies: &mut Vec<HeaderValue>) -> Result<(), SiteError> {
    cookies.push(set_cookie(
        TOKEN_COOKIE,
        session.access_token.as_str().to_string(),
    )?);
    cookies.push(match &session.refresh_token {
        Some(refresh) => set_cookie(REFRESH_COOKIE, refresh.as_str().to_string())?,
        None => clear_cookie(REFRESH_COOKIE)?,
    });
    Ok(())
}

fn forget_tokens(cookies: &mut Vec<HeaderValue>) -> Result<(), SiteError> {
    cookies.push(clear_cookie(TOKEN_COOKIE)?);
    cookies.push(clear_cookie(REFRESH_COOKIE)?);
    Ok(())
}

fn with_cookies(response: impl IntoResponse, cookies: Vec<HeaderValue>) -> Response {
    let mut response = response.into_response();
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// The caller's portal session plus the cookies the response must set.
struct PortalRequest {
    key: SessionKey,
    holder: Option<SharedHolder>,
    cookies: Vec<HeaderValue>,
}

/// Whether [`resolve`] may create a holder for a visitor with no stored
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    /// Only look up an existing holder (or restore one from tokens).
    Existing,
    /// Create the holder when missing.
    Create,
}

fn stored_tokens(jar: &HashMap<String, String>) -> (Option<AccessToken>, Option<RefreshToken>) {
    let read = |name: &str| jar.get(name).filter(|t| !t.is_empty()).cloned();
    (
        read(TOKEN_COOKIE).map(AccessToken::new),
        read(REFRESH_COOKIE).map(RefreshToken::new),
    )
}

async fn resolve(
    state: &AppState,
    headers: &HeaderMap,
    presence: Presence,
) -> Result<PortalRequest, SiteError> {
    let jar = read_cookies(headers);
    let mut cookies = Vec::new();
    let known = jar.get(SESSION_COOKIE).and_then(|v| SessionKey::parse(v));
    let key = known.unwrap_or_default();
    let (access, refresh) = stored_tokens(&jar);
    let has_tokens = access.is_some() || refresh.is_some();

    let holder = match state.sessions.get(key).await {
        Some(holder) => holder,
        None if presence == Presence::Create || has_tokens => {
            if known.is_none() {
                cookies.push(set_cookie(SESSION_COOKIE, key.to_string())?);
            }
            state
                .sessions
                .get_or_insert_with(key, || {
                    SessionHolder::new(key, &state.auth, state.gate.clone(), state.content.clone())
                })
                .await
        }
        None => {
            return Ok(PortalRequest {
                key,
                holder: None,
                cookies,
            });
        }
    };

    {
        let mut guard = holder.write().await;
        guard.sync().await;
        let margin = chrono::Duration::seconds(state.config.token_refresh_margin_secs);
        if guard.state() == AuthState::Anonymous {
            if has_tokens {
                match state.auth.restore(key, access, refresh).await {
                    Ok(session) => {
                        guard.sync().await;
                        store_tokens(&session, &mut cookies)?;
                    }
                    Err(err) => {
                        tracing::info!(session = %key, error = %err, "stored tokens rejected");
                        forget_tokens(&mut cookies)?;
                    }
                }
            }
        } else if let Some(token) = guard.refresh_due(margin, Utc::now()) {
            match state.auth.refresh(key, &token).await {
                Ok(session) => {
                    guard.sync().await;
                    store_tokens(&session, &mut cookies)?;
                }
                Err(err) => {
                    tracing::warn!(session = %key, error = %err, "session refresh failed");
                    state.auth.sign_out(key, None).await;
                    guard.sync().await;
                    guard.set_flash(Notice::error("Session expired", &err));
                    forget_tokens(&mut cookies)?;
                }
            }
        }
    }

    Ok(PortalRequest {
        key,
        holder: Some(holder),
        cookies,
    })
}

fn signed_in(holder: Option<SharedHolder>) -> Result<SharedHolder, SiteError> {
    holder.ok_or_else(|| SiteError::Unauthorized("sign in first".to_string()))
}

/// Query of `GET /portal`.
#[derive(Debug, Default, Deserialize)]
pub struct PortalQuery {
    /// Tab to open (admin only); reloads it.
    pub tab: Option<String>,
    /// `sign-up` shows the registration form.
    pub mode: Option<String>,
    /// `signed-out` confirms a completed sign-out.
    pub status: Option<String>,
}

/// `GET /portal`
///
/// # Errors
///
/// Returns [`SiteError::Template`] if the page fails to render.
pub async fn portal_page(
    State(state): State<AppState>,
    Query(query): Query<PortalQuery>,
    headers: HeaderMap,
) -> Result<Response, SiteError> {
    let request = resolve(&state, &headers, Presence::Existing).await?;
    let sign_in_view = PortalView::SignIn {
        sign_up: query.mode.as_deref() == Some("sign-up"),
    };
    let (flash, view) = match &request.holder {
        None => (None, sign_in_view),
        Some(shared) => {
            let mut holder = shared.write().await;
            let flash = holder.take_flash();
            let email = holder
                .session()
                .and_then(|s| s.user.email.clone())
                .unwrap_or_default();
            let view = match holder.state() {
                AuthState::Anonymous => {
                    // The flash is delivered; nothing else to keep.
                    state.sessions.remove(request.key).await;
                    sign_in_view
                }
                AuthState::Unclassified | AuthState::Regular => PortalView::Dashboard { email },
                AuthState::Admin => match holder.workspace_mut() {
                    Some((workspace, token)) => {
                        if let Some(tab) = query.tab.as_deref().and_then(WorkspaceTab::parse) {
                            workspace.open(tab, token).await;
                        }
                        PortalView::Admin {
                            email,
                            tabs: tabs(workspace.active()),
                            panel: PanelView::active(workspace),
                        }
                    }
                    None => PortalView::Dashboard { email },
                },
            };
            (flash, view)
        }
    };
    let flash = flash.or_else(|| {
        let confirm = query.status.as_deref() == Some("signed-out")
            && matches!(view, PortalView::SignIn { .. });
        confirm.then(|| Notice::success("Logged out successfully"))
    });

    let page = Page::new(branding(&state).await, "portal", PortalBody { flash, view });
    let html = state.templates.render("portal.html", &page)?;
    Ok(with_cookies(html, request.cookies))
}

/// Sign-in and sign-up form.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// `POST /portal/sign-in`
///
/// # Errors
///
/// Returns [`SiteError::Internal`] only if a cookie header cannot be built;
/// auth failures become a flash notice.
pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<Credentials>,
) -> Result<Response, SiteError> {
    let PortalRequest {
        key,
        holder,
        mut cookies,
    } = resolve(&state, &headers, Presence::Create).await?;
    let shared = signed_in(holder)?;
    let mut holder = shared.write().await;
    match state.auth.sign_in(key, &form.email, &form.password).await {
        Ok(session) => {
            store_tokens(&session, &mut cookies)?;
            holder.sync().await;
            holder.set_flash(Notice::success("Logged in successfully!"));
        }
        Err(err) => holder.set_flash(Notice::error("Error", &err)),
    }
    drop(holder);
    Ok(with_cookies(Redirect::to("/portal"), cookies))
}

/// `POST /portal/sign-up`
///
/// # Errors
///
/// Returns [`SiteError::Internal`] only if a cookie header cannot be built;
/// auth failures become a flash notice.
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<Credentials>,
) -> Result<Response, SiteError> {
    let PortalRequest {
        key,
        holder,
        mut cookies,
    } = resolve(&state, &headers, Presence::Create).await?;
    let shared = signed_in(holder)?;
    let mut holder = shared.write().await;
    let target = match state.auth.sign_up(key, &form.email, &form.password).await {
        Ok(SignUpOutcome::SignedIn(session)) => {
            store_tokens(&session, &mut cookies)?;
            holder.sync().await;
            holder.set_flash(Notice::success("Account created!"));
            "/portal"
        }
        Ok(SignUpOutcome::ConfirmationRequired(_)) => {
            holder.set_flash(Notice::success(
                "Account created! Please check your email to verify.",
            ));
            "/portal"
        }
        Err(err) => {
            holder.set_flash(Notice::error("Error", &err));
            "/portal?mode=sign-up"
        }
    };
    drop(holder);
    Ok(with_cookies(Redirect::to(target), cookies))
}

/// `POST /portal/sign-out`: revokes the session, forgets the holder and
/// clears the token cookies.
///
/// # Errors
///
/// Returns [`SiteError::Internal`] only if a cookie header cannot be built.
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, SiteError> {
    let PortalRequest {
        key,
        holder,
        mut cookies,
    } = resolve(&state, &headers, Presence::Existing).await?;
    if let Some(shared) = holder {
        let holder = shared.write().await;
        let token = holder.token().cloned();
        state.auth.sign_out(key, token.as_ref()).await;
        state.sessions.remove(key).await;
    }
    forget_tokens(&mut cookies)?;
    Ok(with_cookies(Redirect::to(SIGNED_OUT), cookies))
}

fn record_id(form: &FormFields) -> Result<RecordId, SiteError> {
    form.get("_id")
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| SiteError::validation("missing or invalid record id"))
}

/// Reads the `_action` field (and its `_id`, `_field`, `_value` companions)
/// of an admin form. The remaining fields are the draft.
///
/// # Errors
///
/// Returns [`SiteError::Validation`] for an unknown action or a missing id.
pub fn parse_action(mut form: FormFields) -> Result<AdminAction, SiteError> {
    let action = form.remove("_action").unwrap_or_default();
    Ok(match action.as_str() {
        "new" => AdminAction::New,
        "edit" => AdminAction::Edit(record_id(&form)?),
        "cancel" => AdminAction::Cancel,
        "save" => {
            form.retain(|name, _| !name.starts_with('_'));
            AdminAction::Save(form)
        }
        "delete" => AdminAction::RequestDelete(record_id(&form)?),
        "confirm-delete" => AdminAction::ConfirmDelete(record_id(&form)?),
        "cancel-delete" => AdminAction::CancelDelete,
        "inline" => AdminAction::Inline {
            id: record_id(&form)?,
            field: form.remove("_field").unwrap_or_default(),
            value: form.remove("_value").unwrap_or_default(),
        },
        other => return Err(SiteError::validation(format!("unknown action: {other}"))),
    })
}

fn parse_tab(slug: &str) -> Result<WorkspaceTab, SiteError> {
    WorkspaceTab::parse(slug).ok_or_else(|| SiteError::NotFound(format!("tab {slug}")))
}

fn require_admin(state: AuthState) -> Result<(), SiteError> {
    match state {
        AuthState::Admin => Ok(()),
        AuthState::Anonymous => Err(SiteError::Unauthorized("sign in first".to_string())),
        AuthState::Unclassified | AuthState::Regular => Err(SiteError::Forbidden),
    }
}

/// `POST /portal/admin/{tab}`: one workspace action.
///
/// # Errors
///
/// Returns [`SiteError::NotFound`] for an unknown tab,
/// [`SiteError::Unauthorized`] without a session and
/// [`SiteError::Forbidden`] for non-admins. Action failures become
/// notices.
pub async fn admin_action(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Form(form): Form<FormFields>,
) -> Result<Response, SiteError> {
    let tab = parse_tab(&slug)?;
    let request = resolve(&state, &headers, Presence::Existing).await?;
    let shared = signed_in(request.holder)?;
    let mut holder = shared.write().await;
    require_admin(holder.state())?;

    let outcome = match parse_action(form) {
        Ok(action) => match holder.workspace_mut() {
            Some((workspace, token)) => workspace.perform(tab, token, action).await,
            None => Err(SiteError::Forbidden),
        },
        Err(err) => Err(err),
    };
    if let Err(err) = outcome {
        tracing::debug!(session = %request.key, tab = tab.slug(), error = %err, "admin action refused");
        holder.set_flash(Notice::error("Error", &err));
    }
    drop(holder);
    Ok(with_cookies(Redirect::to("/portal"), request.cookies))
}

/// `POST /portal/admin/{tab}/upload`: stores the `file` part and writes its
/// public URL into the tab's form. The other parts are the draft as typed.
///
/// # Errors
///
/// Same as [`admin_action`], plus [`SiteError::Validation`] when the tab
/// takes no uploads or the multipart body is malformed.
pub async fn upload(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, SiteError> {
    let tab = parse_tab(&slug)?;
    let category = upload_category(tab)
        .ok_or_else(|| SiteError::validation(format!("{} takes no uploads", tab.label())))?;
    let request = resolve(&state, &headers, Presence::Existing).await?;
    let shared = signed_in(request.holder)?;
    let mut holder = shared.write().await;
    require_admin(holder.state())?;

    let mut fields = FormFields::new();
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SiteError::validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| SiteError::validation(e.to_string()))?;
            file = Some((file_name, bytes.to_vec()));
        } else if !name.starts_with('_') {
            let text = field
                .text()
                .await
                .map_err(|e| SiteError::validation(e.to_string()))?;
            fields.insert(name, text);
        }
    }

    let token = holder.token().cloned();
    let stored = match file {
        Some((file_name, bytes)) => {
            state
                .uploader
                .upload(token.as_ref(), category, &file_name, bytes)
                .await
        }
        None => Err(SiteError::validation("Please choose a non-empty file")),
    };
    let outcome = match stored {
        Ok(object) => {
            fields.insert(category.target_field().to_string(), object.public_url);
            match holder.workspace_mut() {
                Some((workspace, token)) => {
                    workspace.perform(tab, token, AdminAction::Fill(fields)).await
                }
                None => Err(SiteError::Forbidden),
            }
        }
        Err(err) => Err(err),
    };
    match outcome {
        Ok(()) => holder.set_flash(Notice::success("Image uploaded")),
        Err(err) => holder.set_flash(Notice::error("Upload failed", &err)),
    }
    drop(holder);
    Ok(with_cookies(Redirect::to("/portal"), request.cookies))
}
