//! Wraps the auth backend and announces session changes.
//!
//! Each successful sign-in, sign-up with an immediate session, restore,
//! token refresh or sign-out publishes an [`AuthEvent`] addressed to the portal session that
//! caused it. [`super::SessionHolder`]s subscribe to these.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::backend::{AccessToken, AuthBackend, RefreshToken, Session, SignUpOutcome};
use crate::domain::{AuthChange, AuthEvent, EventBus, SessionKey};
use crate::error::SiteError;

/// Auth operations on behalf of portal sessions.
#[derive(Debug, Clone)]
pub struct AuthService {
    auth: Arc<dyn AuthBackend>,
    events: EventBus<AuthEvent>,
    redirect_to: String,
}

impl AuthService {
    /// Creates the service. `redirect_to` is passed on sign-up as the
    /// confirmation email's landing page.
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        events: EventBus<AuthEvent>,
        redirect_to: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            events,
            redirect_to: redirect_to.into(),
        }
    }

    /// Subscribes to all auth events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn announce(&self, session: SessionKey, change: AuthChange) {
        let _ = self.events.publish(AuthEvent { session, change });
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Validation`] for blank credentials and
    /// [`SiteError::Backend`] with the backend's message otherwise.
    pub async fn sign_in(
        &self,
        key: SessionKey,
        email: &str,
        password: &str,
    ) -> Result<Session, SiteError> {
        check_credentials(email, password)?;
        let session = self.auth.sign_in(email.trim(), password).await?;
        tracing::info!(session = %key, user_id = %session.user.id, "signed in");
        self.announce(key, AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    /// Registers an account. A session is announced only when the backend
    /// signs the user in immediately.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::sign_in`].
    pub async fn sign_up(
        &self,
        key: SessionKey,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, SiteError> {
        check_credentials(email, password)?;
        let outcome = self
            .auth
            .sign_up(email.trim(), password, &self.redirect_to)
            .await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                tracing::info!(session = %key, user_id = %session.user.id, "signed up");
                self.announce(key, AuthChange::SignedIn(session.clone()));
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                tracing::info!(session = %key, user_id = %user.id, "sign-up awaiting confirmation");
            }
        }
        Ok(outcome)
    }

    /// Re-establishes a session from stored tokens. A refresh token is
    /// preferred since it also yields a fresh access token and a known
    /// expiry; otherwise the access token is checked as is.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Backend`] when the tokens are no longer valid.
    pub async fn restore(
        &self,
        key: SessionKey,
        access: Option<AccessToken>,
        refresh: Option<RefreshToken>,
    ) -> Result<Session, SiteError> {
        let session = match (refresh, access) {
            (Some(refresh), _) => self.auth.refresh(&refresh).await?,
            (None, Some(access)) => {
                let user = self.auth.user(&access).await?;
                Session {
                    access_token: access,
                    refresh_token: None,
                    expires_at: None,
                    user,
                }
            }
            (None, None) => return Err(SiteError::Unauthorized("no stored session".to_string())),
        };
        tracing::debug!(session = %key, user_id = %session.user.id, "session restored");
        self.announce(key, AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    /// Renews a live session before its access token expires.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Backend`] when the refresh token was revoked or
    /// already spent.
    pub async fn refresh(
        &self,
        key: SessionKey,
        token: &RefreshToken,
    ) -> Result<Session, SiteError> {
        let session = self.auth.refresh(token).await?;
        tracing::debug!(session = %key, user_id = %session.user.id, "session refreshed");
        self.announce(key, AuthChange::Refreshed(session.clone()));
        Ok(session)
    }

    /// Ends the session. The local sign-out always happens; a backend
    /// revocation failure is only logged.
    pub async fn sign_out(&self, key: SessionKey, token: Option<&AccessToken>) {
        if let Some(token) = token
            && let Err(err) = self.auth.sign_out(token).await
        {
            tracing::warn!(session = %key, error = %err, "token revocation failed");
        }
        tracing::info!(session = %key, "signed out");
        self.announce(key, AuthChange::SignedOut);
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), SiteError> {
    if email.trim().is_empty() {
        return Err(SiteError::validation("Email is required"));
    }
    if password.is_empty() {
        return Err(SiteError::validation("Password is required"));
    }
    Ok(())
}
