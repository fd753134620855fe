//! Service layer: the generic resource managers, the portal's auth state
//! machine and asset uploads.
//!
//! Everything here talks to the backend only through the traits in
//! [`crate::backend`], and is written once against [`crate::domain::Resource`].

pub mod auth_service;
pub mod resource_manager;
pub mod resource_table;
pub mod role_gate;
pub mod session_holder;
pub mod session_registry;
pub mod singleton_manager;
pub mod uploads;
pub mod workspace;

pub use auth_service::AuthService;
pub use resource_manager::{Notice, NoticeLevel, ResourceManager};
pub use resource_table::{ContentStore, ResourceTable};
pub use role_gate::{PortalRole, RoleGate};
pub use session_holder::{AuthState, SessionHolder};
pub use session_registry::{SessionRegistry, SharedHolder};
pub use singleton_manager::SingletonManager;
pub use uploads::{StoredObject, UploadCategory, Uploader};
pub use workspace::{AdminAction, AdminWorkspace, WorkspaceTab};
