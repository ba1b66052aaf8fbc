//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain records that already have a stable wire shape (events,
//! registrations, reviews, identities) are embedded as-is.

pub mod event_dto;
pub mod session_dto;

pub use event_dto::*;
pub use session_dto::*;
