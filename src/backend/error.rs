//! Errors reported by the hosted backend or the client that talks to it.

/// A failure reported by (or while talking to) the backend.
///
/// The `Display` output is the backend's own message where one exists, so
/// the portal can surface it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a usable response (network, timeout, TLS).
    #[error("{0}")]
    Transport(String),

    /// The backend answered with an error status.
    #[error("{message}")]
    Rejected {
        /// HTTP-like status code reported by the backend.
        status: u16,
        /// Backend-provided message.
        message: String,
    },

    /// A single-row read matched zero or several rows.
    #[error("expected a single row, found {found}")]
    RowCount {
        /// Number of rows actually matched.
        found: usize,
    },

    /// The response body did not have the expected shape.
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Shorthand for a [`BackendError::Rejected`] with the given status.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::RowCount { found: 0 },
            sqlx::Error::Database(db) => Self::rejected(400, db.message()),
            other @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
                Self::Decode(other.to_string())
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
