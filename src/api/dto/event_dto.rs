//! Event, registration and review DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Event, EventId, Registration, Review};
use crate::service::OrganizerEvent;

/// Response to `POST /events`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEventResponse {
    /// Store-assigned id.
    pub event_id: EventId,
    /// Confirmation text.
    pub message: String,
}

/// Query string of `GET /events`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct EventQuery {
    /// Case-insensitive substring of the event name.
    #[serde(default)]
    pub q: Option<String>,
}

/// An event as listed to one viewer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventView {
    /// The event.
    #[serde(flatten)]
    pub event: Event,
    /// Whether the viewer holds a registration; absent for anonymous
    /// viewers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_registered: Option<bool>,
}

/// Response to `GET /events`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventListResponse {
    /// Matching events, oldest first.
    pub events: Vec<EventView>,
    /// Number of matching events.
    pub total: usize,
}

/// Body of `POST /events/{id}/registrations`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Picked ticket category.
    #[serde(default)]
    pub ticket_category: String,
}

/// Response to a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    /// The written registration.
    pub registration: Registration,
    /// Price as displayed: the copied price or `"N/A"`.
    pub displayed_price: String,
    /// Confirmation text.
    pub message: String,
}

/// Response to `GET /my-registrations`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationListResponse {
    /// The caller's registrations.
    pub registrations: Vec<Registration>,
}

/// Body of `POST /events/{id}/reviews`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// Review text.
    #[serde(default)]
    pub review: String,
}

/// Response to a written review.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    /// The written review.
    pub review: Review,
    /// Confirmation text.
    pub message: String,
}

/// Response to `GET /events/{id}/reviews`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewListResponse {
    /// Event reviewed.
    pub event_id: EventId,
    /// Reviews, oldest first.
    pub reviews: Vec<Review>,
}

/// Response to `GET /my-events`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizerResponse {
    /// The caller's events with per-category tallies.
    pub events: Vec<OrganizerEvent>,
}
