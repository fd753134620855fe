//! # energies-site
//!
//! Marketing website and content portal for a bulk fuel distributor.
//!
//! Public pages render published content (fuel prices, services, team,
//! news, job listings, contact details and branding) from a hosted
//! backend. Administrators sign in to the portal and edit every table
//! through one generic resource manager; regular users see a dashboard.
//! A small JSON API and a WebSocket change feed expose the same content.
//!
//! ## Architecture
//!
//! ```text
//! Browsers, API clients, WebSocket clients
//!     │
//!     ├── Pages + Portal (web/)      REST (api/)      Change feed (ws/)
//!     │
//!     ├── ResourceManager / SessionHolder / Uploader (service/)
//!     ├── Resource entities, quote estimator, EventBus (domain/)
//!     │
//!     └── DataBackend / AuthBackend / StorageBackend (backend/)
//!             ├── Supabase (REST, auth, storage over HTTP)
//!             ├── PostgreSQL (tables via sqlx)
//!             └── In-memory
//! ```

pub mod api;
pub mod app_state;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod web;
pub mod ws;
