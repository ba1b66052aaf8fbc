//! Service layer: validation and orchestration.
//!
//! [`EventService`] checks the signed-in identity and required inputs,
//! then delegates to the [`crate::store::EventStore`]. Both the view
//! flows and the HTTP handlers go through it.

pub mod event_service;

pub use event_service::{
    EVENT_CREATED, EventDraft, EventService, OrganizerEvent, REGISTERED, REVIEW_SUBMITTED,
    filter_by_name, sort_events,
};
