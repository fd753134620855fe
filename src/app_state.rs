//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::Backends;
use crate::config::SiteConfig;
use crate::domain::EventBus;
use crate::error::SiteError;
use crate::service::{AuthService, ContentStore, RoleGate, SessionRegistry, Uploader};
use crate::web::templates::Templates;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<SiteConfig>,
    /// Content tables and the change feed.
    pub content: ContentStore,
    /// Sign-in, sign-up and sign-out.
    pub auth: AuthService,
    /// Admin role lookup.
    pub gate: RoleGate,
    /// Logo and avatar uploads.
    pub uploader: Uploader,
    /// Live portal sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Parsed page templates.
    pub templates: Templates,
}

impl AppState {
    /// Wires the services over `backends`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Template`] when the embedded templates do not
    /// parse.
    pub fn new(config: SiteConfig, backends: Backends) -> Result<Self, SiteError> {
        let capacity = config.event_bus_capacity;
        Ok(Self {
            content: ContentStore::new(Arc::clone(&backends.data), EventBus::new(capacity)),
            auth: AuthService::new(
                Arc::clone(&backends.auth),
                EventBus::new(capacity),
                config.portal_redirect(),
            ),
            gate: RoleGate::new(Arc::clone(&backends.data)),
            uploader: Uploader::new(
                Arc::clone(&backends.storage),
                config.logo_bucket.clone(),
                config.avatar_bucket.clone(),
            ),
            sessions: Arc::new(SessionRegistry::new(Duration::from_secs(
                config.session_idle_secs,
            ))),
            templates: Templates::load()?,
            config: Arc::new(config),
        })
    }
}
