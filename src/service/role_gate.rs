//! Classifies an authenticated user as administrator or regular user.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::{AccessToken, DataBackend, Select};
use crate::domain::UserRole;

/// Outcome of the role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalRole {
    /// Sees the content workspace.
    Admin,
    /// Sees the customer dashboard.
    Regular,
}

/// One `user_roles` lookup per call; no caching.
///
/// Fails closed: a missing row, an unknown role or any backend error all
/// classify as [`PortalRole::Regular`].
#[derive(Debug, Clone)]
pub struct RoleGate {
    data: Arc<dyn DataBackend>,
}

impl RoleGate {
    /// Creates a gate reading through `data`.
    #[must_use]
    pub fn new(data: Arc<dyn DataBackend>) -> Self {
        Self { data }
    }

    /// Looks up the role of `user_id`.
    pub async fn classify(&self, auth: Option<&AccessToken>, user_id: uuid::Uuid) -> PortalRole {
        let query = Select::from(UserRole::TABLE)
            .eq("user_id", user_id.to_string())
            .limit(1);
        let row = match self.data.select_single(auth, &query).await {
            Ok(row) => row,
            Err(err) => {
                tracing::debug!(%user_id, error = %err, "role lookup failed; treating as regular");
                return PortalRole::Regular;
            }
        };
        match serde_json::from_value::<UserRole>(Value::Object(row)) {
            Ok(role) if role.is_admin() => PortalRole::Admin,
            Ok(_) => PortalRole::Regular,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "undecodable user_roles row");
                PortalRole::Regular
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::backend::memory::MemoryBackend;

    fn gate(backend: &Arc<MemoryBackend>) -> RoleGate {
        RoleGate::new(Arc::clone(backend) as Arc<dyn DataBackend>)
    }

    #[tokio::test]
    async fn missing_row_is_regular() {
        let backend = Arc::new(MemoryBackend::new());
        let role = gate(&backend).classify(None, uuid::Uuid::new_v4()).await;
        assert_eq!(role, PortalRole::Regular);
    }

    #[tokio::test]
    async fn admin_row_is_admin() {
        let backend = Arc::new(MemoryBackend::new());
        let user = uuid::Uuid::new_v4();
        backend.grant_role(user, "admin").await;
        assert_eq!(gate(&backend).classify(None, user).await, PortalRole::Admin);
    }

    #[tokio::test]
    async fn user_row_is_regular() {
        let backend = Arc::new(MemoryBackend::new());
        let user = uuid::Uuid::new_v4();
        backend.grant_role(user, "user").await;
        assert_eq!(gate(&backend).classify(None, user).await, PortalRole::Regular);
    }

    #[tokio::test]
    async fn lookup_error_is_regular() {
        let backend = Arc::new(MemoryBackend::new());
        let user = uuid::Uuid::new_v4();
        backend.grant_role(user, "admin").await;
        backend
            .fail_table("user_roles", BackendError::rejected(500, "boom"))
            .await;
        assert_eq!(gate(&backend).classify(None, user).await, PortalRole::Regular);
    }
}
