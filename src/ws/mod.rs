//! WebSocket layer: the content change feed.
//!
//! Clients connect to `/ws`, subscribe to table names (or `"*"`), and
//! receive a `content_changed` event after every admin mutation of a
//! subscribed table. Clients that render site content use these events to
//! know when to refetch.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
