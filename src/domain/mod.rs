//! Domain layer: content entities, the resource abstraction, the quote
//! estimator and in-process events.
//!
//! Every content table is modelled as a [`Resource`] with a matching
//! [`ResourceDraft`] form type. The service layer is written once against
//! these traits.

pub mod contact_info;
pub mod contact_message;
pub mod event_bus;
pub mod fuel_price;
pub mod job_listing;
pub mod news_item;
pub mod quote;
pub mod record_id;
pub mod resource;
pub mod service;
pub mod site_event;
pub mod site_settings;
pub mod team_member;
pub mod user_role;

pub use contact_info::ContactInfo;
pub use contact_message::ContactMessage;
pub use event_bus::EventBus;
pub use fuel_price::FuelPrice;
pub use job_listing::JobListing;
pub use news_item::NewsItem;
pub use record_id::RecordId;
pub use resource::{FieldKind, FieldSpec, FormFields, Resource, ResourceDraft};
pub use service::Service;
pub use site_event::{AuthChange, AuthEvent, ContentAction, SessionKey, SiteEvent};
pub use site_settings::SiteSettings;
pub use team_member::TeamMember;
pub use user_role::{AppRole, UserRole};
