//! Per-browser auth state machine of the portal.
//!
//! ```text
//! Anonymous ──sign-in / sign-up / restore──▶ Unclassified ──role gate──▶ Regular | Admin
//!     ▲                                                                      │
//!     └──────────────────────────────── sign-out ────────────────────────────┘
//! ```
//!
//! A token refresh keeps the signed-in state and the admin workspace and
//! only swaps the session. The holder subscribes to the [`AuthService`] bus
//! when created and only reacts to events addressed to its own
//! [`SessionKey`]. Dropping it drops the subscription.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use super::{AdminWorkspace, AuthService, ContentStore, Notice, PortalRole, RoleGate};
use crate::backend::{AccessToken, RefreshToken, Session};
use crate::domain::{AuthChange, AuthEvent, SessionKey};

/// Where a portal session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No session.
    Anonymous,
    /// Signed in; role lookup not yet resolved.
    Unclassified,
    /// Signed in as a regular user.
    Regular,
    /// Signed in as an administrator.
    Admin,
}

/// Auth state, session and admin workspace of one portal session.
#[derive(Debug)]
pub struct SessionHolder {
    key: SessionKey,
    state: AuthState,
    session: Option<Session>,
    workspace: Option<AdminWorkspace>,
    flash: Option<Notice>,
    events: broadcast::Receiver<AuthEvent>,
    gate: RoleGate,
    store: ContentStore,
}

impl SessionHolder {
    /// Creates an anonymous holder subscribed to `auth`'s events.
    #[must_use]
    pub fn new(key: SessionKey, auth: &AuthService, gate: RoleGate, store: ContentStore) -> Self {
        Self {
            key,
            state: AuthState::Anonymous,
            session: None,
            workspace: None,
            flash: None,
            events: auth.subscribe(),
            gate,
            store,
        }
    }

    /// The portal session this holder belongs to.
    #[must_use]
    pub const fn key(&self) -> SessionKey {
        self.key
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// The active session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Access token of the active session.
    #[must_use]
    pub fn token(&self) -> Option<&AccessToken> {
        self.session.as_ref().map(|s| &s.access_token)
    }

    /// The admin workspace; present only in [`AuthState::Admin`].
    #[must_use]
    pub fn workspace(&self) -> Option<&AdminWorkspace> {
        self.workspace.as_ref()
    }

    /// The refresh token to spend when the access token expires within
    /// `margin` of `now`. `None` while anonymous, when the session is still
    /// fresh, or when the backend issued no refresh token.
    #[must_use]
    pub fn refresh_due(
        &self,
        margin: chrono::Duration,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Option<RefreshToken> {
        self.session
            .as_ref()
            .filter(|s| s.expires_within(margin, now))
            .and_then(|s| s.refresh_token.clone())
    }

    /// Mutable access to the admin workspace together with the token its
    /// calls must carry.
    pub fn workspace_mut(&mut self) -> Option<(&mut AdminWorkspace, Option<&AccessToken>)> {
        let token = self.session.as_ref().map(|s| &s.access_token);
        self.workspace.as_mut().map(|w| (w, token))
    }

    /// Holds a notice for the next page render (auth outcomes).
    pub fn set_flash(&mut self, notice: Notice) {
        self.flash = Some(notice);
    }

    /// Takes the held notice, if any.
    pub fn take_flash(&mut self) -> Option<Notice> {
        self.flash.take()
    }

    /// Applies every pending event addressed to this session, running the
    /// role gate after each sign-in.
    pub async fn sync(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) if event.session == self.key => self.apply(event.change).await,
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(session = %self.key, skipped, "auth events lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    async fn apply(&mut self, change: AuthChange) {
        match change {
            AuthChange::SignedIn(session) => self.establish(session).await,
            AuthChange::Refreshed(session) => {
                let same_user = self
                    .session
                    .as_ref()
                    .is_some_and(|current| current.user.id == session.user.id);
                if same_user {
                    tracing::debug!(session = %self.key, "session tokens renewed");
                    self.session = Some(session);
                } else {
                    self.establish(session).await;
                }
            }
            AuthChange::SignedOut => {
                self.state = AuthState::Anonymous;
                self.session = None;
                self.workspace = None;
            }
        }
    }

    async fn establish(&mut self, session: Session) {
        let user_id = session.user.id;
        self.state = AuthState::Unclassified;
        self.workspace = None;
        self.session = Some(session);

        let role = self.gate.classify(self.token(), user_id).await;
        match role {
            PortalRole::Admin => {
                let mut workspace = AdminWorkspace::new(&self.store);
                let tab = workspace.active();
                workspace.open(tab, self.token()).await;
                self.workspace = Some(workspace);
                self.state = AuthState::Admin;
            }
            PortalRole::Regular => self.state = AuthState::Regular,
        }
        tracing::debug!(session = %self.key, %user_id, state = ?self.state, "session classified");
    }
}
