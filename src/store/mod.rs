//! Event store client: events, registrations and reviews.
//!
//! [`EventStore`] is the seam to the document database. Every method is a
//! single round trip; list operations return an empty `Vec` for "no data"
//! and make no ordering promise. Two backends are shipped:
//! [`InMemoryEventStore`] and [`PostgresEventStore`].

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    Event, EventId, NewEvent, NewRegistration, NewReview, Registration, Review, UserId,
};

pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;

/// Store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No event with this id.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// The user already holds a registration for this event and the
    /// one-per-user rule is on.
    #[error("already registered for event {0}")]
    DuplicateRegistration(EventId),

    /// Backend failure; the message is the backend's own.
    #[error("{0}")]
    Backend(String),
}

/// Whether [`EventStore::record_registration`] admits a second
/// registration by the same user for the same event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistrationPolicy {
    /// Any number of registrations per user and event.
    #[default]
    AllowDuplicates,
    /// At most one registration per user and event.
    OnePerUser,
}

/// Create/read/update access to the three record collections.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Appends an event with its registration count at zero and returns
    /// the assigned id.
    async fn create_event(&self, event: NewEvent) -> Result<EventId, StoreError>;

    /// Fetches one event.
    async fn get_event(&self, id: EventId) -> Result<Event, StoreError>;

    /// All events, unfiltered and unpaginated.
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    /// Events whose creator is `creator`.
    async fn list_events_by_creator(&self, creator: &UserId) -> Result<Vec<Event>, StoreError>;

    /// Adds exactly one to the stored registration count, atomically at
    /// the store.
    async fn increment_registration_count(&self, id: EventId) -> Result<(), StoreError>;

    /// Subtracts one from the stored registration count, never below zero.
    async fn decrement_registration_count(&self, id: EventId) -> Result<(), StoreError>;

    /// Appends a registration record.
    async fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> Result<Registration, StoreError>;

    /// Registrations made by `user`.
    async fn list_registrations_by_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Registration>, StoreError>;

    /// Registrations referencing `event`.
    async fn list_registrations_by_event(
        &self,
        event: EventId,
    ) -> Result<Vec<Registration>, StoreError>;

    /// Appends a review.
    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError>;

    /// Reviews referencing `event`.
    async fn list_reviews_by_event(&self, event: EventId) -> Result<Vec<Review>, StoreError>;

    /// Increments the event's counter and writes the registration.
    ///
    /// This default runs the two writes in sequence. If the record write
    /// fails after the increment succeeded, it decrements again. Between
    /// the two writes, and if the decrement itself fails, the counter
    /// overstates the records. Backends with multi-record transactions
    /// override this with a single atomic unit.
    async fn record_registration(
        &self,
        registration: NewRegistration,
        policy: RegistrationPolicy,
    ) -> Result<Registration, StoreError> {
        let event_id = registration.event_id;
        if policy == RegistrationPolicy::OnePerUser {
            let existing = self
                .list_registrations_by_user(&registration.user_id)
                .await?;
            if existing.iter().any(|r| r.event_id == event_id) {
                return Err(StoreError::DuplicateRegistration(event_id));
            }
        }

        self.increment_registration_count(event_id).await?;

        match self.create_registration(registration).await {
            Ok(recorded) => Ok(recorded),
            Err(err) => {
                tracing::warn!(%event_id, error = %err, "registration write failed; compensating");
                if let Err(undo) = self.decrement_registration_count(event_id).await {
                    tracing::error!(%event_id, error = %undo, "compensating decrement failed; count overstated");
                }
                Err(err)
            }
        }
    }
}
