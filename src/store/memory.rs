//! In-process event store.
//!
//! Each collection sits behind its own [`tokio::sync::RwLock`]. Writers
//! that touch two collections always take the events lock first, then
//! registrations, so the lock order is fixed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventStore, RegistrationPolicy, StoreError};
use crate::domain::{
    Event, EventId, NewEvent, NewRegistration, NewReview, Registration, RegistrationId, Review,
    ReviewId, UserId,
};

/// Event store held entirely in memory.
///
/// # Concurrency
///
/// - Reads of any collection run concurrently.
/// - Counter updates take the events write lock, so concurrent
///   increments never lose an update.
/// - [`EventStore::record_registration`] holds the events and
///   registrations write locks together, making the counter bump and the
///   record append one atomic step.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<EventId, Event>>,
    registrations: RwLock<Vec<Registration>>,
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Number of stored registrations.
    pub async fn registration_count(&self) -> usize {
        self.registrations.read().await.len()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn create_event(&self, event: NewEvent) -> Result<EventId, StoreError> {
        let id = EventId::new();
        let mut events = self.events.write().await;
        events.insert(id, event.into_event(id));
        Ok(id)
    }

    async fn get_event(&self, id: EventId) -> Result<Event, StoreError> {
        self.events
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::EventNotFound(id))
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.events.read().await.values().cloned().collect())
    }

    async fn list_events_by_creator(&self, creator: &UserId) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .events
            .read()
            .await
            .values()
            .filter(|event| &event.creator == creator)
            .cloned()
            .collect())
    }

    async fn increment_registration_count(&self, id: EventId) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or(StoreError::EventNotFound(id))?;
        event.registrations = event.registrations.saturating_add(1);
        Ok(())
    }

    async fn decrement_registration_count(&self, id: EventId) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or(StoreError::EventNotFound(id))?;
        event.registrations = event.registrations.saturating_sub(1);
        Ok(())
    }

    async fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> Result<Registration, StoreError> {
        let recorded = registration.into_registration(RegistrationId::new());
        self.registrations.write().await.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_registrations_by_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Registration>, StoreError> {
        Ok(self
            .registrations
            .read()
            .await
            .iter()
            .filter(|r| &r.user_id == user)
            .cloned()
            .collect())
    }

    async fn list_registrations_by_event(
        &self,
        event: EventId,
    ) -> Result<Vec<Registration>, StoreError> {
        Ok(self
            .registrations
            .read()
            .await
            .iter()
            .filter(|r| r.event_id == event)
            .cloned()
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let recorded = review.into_review(ReviewId::new());
        self.reviews.write().await.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_reviews_by_event(&self, event: EventId) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.event_id == event)
            .cloned()
            .collect())
    }

    async fn record_registration(
        &self,
        registration: NewRegistration,
        policy: RegistrationPolicy,
    ) -> Result<Registration, StoreError> {
        let event_id = registration.event_id;
        let mut events = self.events.write().await;
        let mut registrations = self.registrations.write().await;

        let event = events
            .get_mut(&event_id)
            .ok_or(StoreError::EventNotFound(event_id))?;
        if policy == RegistrationPolicy::OnePerUser
            && registrations
                .iter()
                .any(|r| r.event_id == event_id && r.user_id == registration.user_id)
        {
            return Err(StoreError::DuplicateRegistration(event_id));
        }

        event.registrations = event.registrations.saturating_add(1);
        let recorded = registration.into_registration(RegistrationId::new());
        registrations.push(recorded.clone());
        Ok(recorded)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::domain::{EventKind, SeatCategory};
    use crate::store::test_support::FailingStore;

    fn new_event(creator: &str) -> NewEvent {
        NewEvent {
            name: "Launch".to_string(),
            description: "Product launch".to_string(),
            kind: EventKind::InPerson,
            audience: "Everyone".to_string(),
            date: "2025-01-01".to_string(),
            creator: UserId::new(creator),
            created_at: Utc::now(),
            seats: vec![SeatCategory::new("GA", "100")],
        }
    }

    fn new_registration(user: &str, event_id: EventId) -> NewRegistration {
        NewRegistration {
            user_id: UserId::new(user),
            event_id,
            ticket_category: "GA".to_string(),
            price: Some("100".to_string()),
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_get_event() {
        let store = InMemoryEventStore::new();
        let Ok(id) = store.create_event(new_event("u1")).await else {
            panic!("create failed");
        };
        let Ok(event) = store.get_event(id).await else {
            panic!("event missing");
        };
        assert_eq!(event.id, id);
        assert_eq!(event.registrations, 0);
        assert_eq!(event.seats.len(), 1);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let store = InMemoryEventStore::new();
        let id = EventId::new();
        assert_eq!(store.get_event(id).await, Err(StoreError::EventNotFound(id)));
        assert_eq!(
            store.increment_registration_count(id).await,
            Err(StoreError::EventNotFound(id))
        );
    }

    #[tokio::test]
    async fn empty_lists_are_not_errors() {
        let store = InMemoryEventStore::new();
        assert_eq!(store.list_events().await.map(|v| v.len()), Ok(0));
        assert_eq!(
            store
                .list_registrations_by_user(&UserId::new("nobody"))
                .await
                .map(|v| v.len()),
            Ok(0)
        );
        assert_eq!(
            store.list_reviews_by_event(EventId::new()).await.map(|v| v.len()),
            Ok(0)
        );
    }

    #[tokio::test]
    async fn list_by_creator_filters() {
        let store = InMemoryEventStore::new();
        let _ = store.create_event(new_event("u1")).await;
        let _ = store.create_event(new_event("u1")).await;
        let _ = store.create_event(new_event("u2")).await;

        assert_eq!(store.event_count().await, 3);
        let mine = store.list_events_by_creator(&UserId::new("u1")).await;
        assert_eq!(mine.map(|v| v.len()), Ok(2));
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryEventStore::new());
        let Ok(id) = store.create_event(new_event("u1")).await else {
            panic!("create failed");
        };

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment_registration_count(id).await
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }

        let count = store.get_event(id).await.map(|e| e.registrations);
        assert_eq!(count, Ok(50));
    }

    #[tokio::test]
    async fn decrement_stops_at_zero() {
        let store = InMemoryEventStore::new();
        let Ok(id) = store.create_event(new_event("u1")).await else {
            panic!("create failed");
        };
        assert!(store.decrement_registration_count(id).await.is_ok());
        assert_eq!(store.get_event(id).await.map(|e| e.registrations), Ok(0));
    }

    #[tokio::test]
    async fn record_registration_bumps_count_and_appends() {
        let store = InMemoryEventStore::new();
        let Ok(id) = store.create_event(new_event("organiser")).await else {
            panic!("create failed");
        };

        let result = store
            .record_registration(new_registration("u2", id), RegistrationPolicy::default())
            .await;
        let Ok(recorded) = result else {
            panic!("registration failed");
        };
        assert_eq!(recorded.event_id, id);
        assert_eq!(store.get_event(id).await.map(|e| e.registrations), Ok(1));
        assert_eq!(store.registration_count().await, 1);

        let by_event = store.list_registrations_by_event(id).await;
        assert_eq!(by_event.map(|v| v.len()), Ok(1));
    }

    #[tokio::test]
    async fn one_per_user_policy_rejects_second_registration() {
        let store = InMemoryEventStore::new();
        let Ok(id) = store.create_event(new_event("organiser")).await else {
            panic!("create failed");
        };
        let policy = RegistrationPolicy::OnePerUser;
        assert!(store.record_registration(new_registration("u2", id), policy).await.is_ok());
        assert_eq!(
            store.record_registration(new_registration("u2", id), policy).await,
            Err(StoreError::DuplicateRegistration(id))
        );
        assert_eq!(store.get_event(id).await.map(|e| e.registrations), Ok(1));

        // Default policy lets the same user in twice.
        let twice = store
            .record_registration(new_registration("u2", id), RegistrationPolicy::AllowDuplicates)
            .await;
        assert!(twice.is_ok());
        assert_eq!(store.get_event(id).await.map(|e| e.registrations), Ok(2));
    }

    #[tokio::test]
    async fn default_path_compensates_failed_record_write() {
        let store = FailingStore::rejecting_registrations("permission denied");
        let Ok(id) = store.create_event(new_event("organiser")).await else {
            panic!("create failed");
        };

        let result = store
            .record_registration(new_registration("u2", id), RegistrationPolicy::default())
            .await;
        assert_eq!(result, Err(StoreError::Backend("permission denied".to_string())));
        assert_eq!(store.get_event(id).await.map(|e| e.registrations), Ok(0));
    }

    #[tokio::test]
    async fn reviews_are_filtered_by_event() {
        let store = InMemoryEventStore::new();
        let Ok(a) = store.create_event(new_event("u1")).await else {
            panic!("create failed");
        };
        let Ok(b) = store.create_event(new_event("u1")).await else {
            panic!("create failed");
        };
        for (event_id, body) in [(a, "great"), (a, "loud"), (b, "fine")] {
            let _ = store
                .create_review(NewReview {
                    user_id: UserId::new("u2"),
                    event_id,
                    body: body.to_string(),
                    created_at: Utc::now(),
                })
                .await;
        }
        assert_eq!(store.list_reviews_by_event(a).await.map(|v| v.len()), Ok(2));
        assert_eq!(store.list_reviews_by_event(b).await.map(|v| v.len()), Ok(1));
    }
}
