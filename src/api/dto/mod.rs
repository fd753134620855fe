//! Data Transfer Objects for REST request/response serialization.
//!
//! Content rows are served as their domain types; only responses that add
//! derived fields get a DTO of their own.

pub mod quote_dto;

pub use quote_dto::*;
