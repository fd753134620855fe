//! Rows of `user_roles`, mapping a user to a role.

use serde::{Deserialize, Serialize};

/// Role string stored in `user_roles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    /// Full access to the content workspace.
    Admin,
    /// Ordinary customer account.
    User,
    /// Any role string this site does not know.
    #[serde(other)]
    Other,
}

/// One row of `user_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// Auth user id.
    pub user_id: uuid::Uuid,
    /// Assigned role.
    pub role: AppRole,
}

impl UserRole {
    /// Table name.
    pub const TABLE: &'static str = "user_roles";

    /// Whether this row grants the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == AppRole::Admin
    }
}
