//! Events broadcast inside the process.
//!
//! [`SiteEvent`]s announce content mutations to the WebSocket change feed.
//! [`AuthEvent`]s announce auth state changes of one portal session to that
//! session's holder.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;
use crate::backend::Session;

/// Kind of content mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAction {
    /// A row was inserted.
    Created,
    /// A row was updated.
    Updated,
    /// A row was deleted.
    Deleted,
}

/// Event emitted after every successful content mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SiteEvent {
    /// A row of a content table changed.
    ContentChanged {
        /// Table name.
        table: &'static str,
        /// What happened.
        action: ContentAction,
        /// Affected row.
        record_id: RecordId,
        /// When the mutation completed.
        timestamp: DateTime<Utc>,
    },
}

impl SiteEvent {
    /// Builds a [`SiteEvent::ContentChanged`] stamped now.
    #[must_use]
    pub fn content_changed(table: &'static str, action: ContentAction, record_id: RecordId) -> Self {
        Self::ContentChanged {
            table,
            action,
            record_id,
            timestamp: Utc::now(),
        }
    }

    /// Table the event concerns.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::ContentChanged { table, .. } => table,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ContentChanged { .. } => "content_changed",
        }
    }
}

/// Opaque key of one browser's portal session (the `portal_session`
/// cookie value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(uuid::Uuid);

impl SessionKey {
    /// Mints a fresh random key.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parses a cookie value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<uuid::Uuid>().ok().map(Self)
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Auth state change reported by the auth backend wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    /// A session was established (sign-in, sign-up or restore).
    SignedIn(Session),
    /// The session's tokens were renewed. Carries the new session.
    Refreshed(Session),
    /// The session ended.
    SignedOut,
}

/// An [`AuthChange`] addressed to one portal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    /// Portal session the change belongs to.
    pub session: SessionKey,
    /// The change.
    pub change: AuthChange,
}
