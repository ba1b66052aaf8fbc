//! Event service: validation and orchestration over the [`EventStore`].

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Event, EventId, EventKind, Identity, NewEvent, NewRegistration, NewReview, Registration,
    Review, SeatCategory, UserId, tally_by_category,
};
use crate::error::AppError;
use crate::store::{EventStore, RegistrationPolicy, StoreError};

/// Confirmation shown after an event is written.
pub const EVENT_CREATED: &str = "Event created successfully!";
/// Confirmation shown after a registration is recorded.
pub const REGISTERED: &str = "Registered successfully!";
/// Confirmation shown after a review is written.
pub const REVIEW_SUBMITTED: &str = "Review submitted successfully!";

const LOGIN_TO_CREATE: &str = "You must be logged in to create an event!";
const LOGIN_TO_REGISTER: &str = "You must be logged in to register!";
const SELECT_CATEGORY: &str = "Please select a ticket category!";
const LOGIN_TO_REVIEW: &str = "You must be logged in to submit a review!";
const WRITE_REVIEW: &str = "Please write a review before submitting!";

/// The event form as filled in by an organiser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventDraft {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// In person or virtual.
    #[serde(default)]
    pub kind: EventKind,
    /// Free-text target audience.
    #[serde(default)]
    pub audience: String,
    /// Event date as entered.
    #[serde(default)]
    pub date: String,
    /// Ticket tiers in display order.
    #[serde(default)]
    pub seats: Vec<SeatCategory>,
}

impl Default for EventDraft {
    /// A blank form with a single blank seat row.
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            kind: EventKind::default(),
            audience: String::new(),
            date: String::new(),
            seats: vec![SeatCategory::default()],
        }
    }
}

impl EventDraft {
    /// Checks the required text fields.
    ///
    /// Seat rows are written as typed: blank categories and non-numeric
    /// prices pass.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] naming the first empty field, in
    /// form order: date, name, description, audience.
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("Date", &self.date),
            ("Name", &self.name),
            ("Description", &self.description),
            ("Audience", &self.audience),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(AppError::validation(format!("{field} is required")));
            }
        }
        Ok(())
    }

    fn into_new_event(self, creator: UserId) -> NewEvent {
        NewEvent {
            name: self.name,
            description: self.description,
            kind: self.kind,
            audience: self.audience,
            date: self.date,
            creator,
            created_at: Utc::now(),
            seats: self.seats,
        }
    }
}

/// One row of the organiser dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrganizerEvent {
    /// The organiser's event.
    pub event: Event,
    /// Registration count per recorded ticket category. Categories with
    /// no registrations are absent.
    pub tallies: BTreeMap<String, u64>,
}

/// Orders events oldest first, then by name.
///
/// The store promises no order, so every listing is sorted here.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Keeps the events whose name contains `query`, ignoring case.
#[must_use]
pub fn filter_by_name<'a>(events: &'a [Event], query: &str) -> Vec<&'a Event> {
    events.iter().filter(|e| e.name_matches(query)).collect()
}

/// Shared orchestration for the flows and the HTTP handlers.
///
/// Holds no per-user state: the caller passes the signed-in
/// [`Identity`] (or `None`) into every gated operation.
#[derive(Debug, Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    policy: RegistrationPolicy,
}

impl EventService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, policy: RegistrationPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Returns the duplicate-registration policy in force.
    #[must_use]
    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Validates `draft` and writes it as a new event owned by `creator`.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthenticated`] without an identity,
    /// [`AppError::Validation`] for an empty required field, or the
    /// store's failure.
    pub async fn create_event(
        &self,
        creator: Option<&Identity>,
        draft: EventDraft,
    ) -> Result<EventId, AppError> {
        let creator = creator.ok_or_else(|| AppError::unauthenticated(LOGIN_TO_CREATE))?;
        draft.validate()?;

        let new_event = draft.into_new_event(creator.user_id.clone());
        let event_id = self
            .store
            .create_event(new_event)
            .await
            .map_err(|err| log_store_failure("create event", err))?;

        tracing::info!(%event_id, creator = %creator.user_id, "event created");
        Ok(event_id)
    }

    /// Fetches one event.
    ///
    /// # Errors
    ///
    /// [`AppError::EventNotFound`] or the store's failure.
    pub async fn get_event(&self, event_id: EventId) -> Result<Event, AppError> {
        Ok(self.store.get_event(event_id).await?)
    }

    /// All events, sorted.
    ///
    /// # Errors
    ///
    /// Returns the store's failure.
    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let mut events = self
            .store
            .list_events()
            .await
            .map_err(|err| log_store_failure("list events", err))?;
        sort_events(&mut events);
        Ok(events)
    }

    /// Events whose name contains `query`, ignoring case. An empty query
    /// returns every event.
    ///
    /// # Errors
    ///
    /// Returns the store's failure.
    pub async fn search_events(&self, query: &str) -> Result<Vec<Event>, AppError> {
        let mut events = self.list_events().await?;
        events.retain(|e| e.name_matches(query));
        Ok(events)
    }

    /// Registrations made by `user`.
    ///
    /// # Errors
    ///
    /// Returns the store's failure.
    pub async fn registrations_of(&self, user: &UserId) -> Result<Vec<Registration>, AppError> {
        self.store
            .list_registrations_by_user(user)
            .await
            .map_err(|err| log_store_failure("list registrations", err))
    }

    /// Ids of the events `user` already holds a registration for.
    ///
    /// # Errors
    ///
    /// Returns the store's failure.
    pub async fn registered_event_ids(&self, user: &UserId) -> Result<HashSet<EventId>, AppError> {
        Ok(self
            .registrations_of(user)
            .await?
            .into_iter()
            .map(|r| r.event_id)
            .collect())
    }

    /// Registers `identity` for `event` in `category`.
    ///
    /// The price is copied from the first seat tier whose name equals
    /// `category`; a category with no matching tier is recorded without
    /// a price.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthenticated`] without an identity,
    /// [`AppError::Validation`] for an empty category,
    /// [`AppError::AlreadyRegistered`] under the one-per-user policy, or
    /// the store's failure. No store write happens for the first two.
    pub async fn register(
        &self,
        identity: Option<&Identity>,
        event: &Event,
        category: &str,
    ) -> Result<Registration, AppError> {
        let identity = identity.ok_or_else(|| AppError::unauthenticated(LOGIN_TO_REGISTER))?;
        if category.is_empty() {
            return Err(AppError::validation(SELECT_CATEGORY));
        }

        let registration = NewRegistration {
            user_id: identity.user_id.clone(),
            event_id: event.id,
            ticket_category: category.to_string(),
            price: event.price_for(category).map(str::to_string),
            registered_at: Utc::now(),
        };

        let recorded = self
            .store
            .record_registration(registration, self.policy)
            .await
            .map_err(|err| log_store_failure("register", err))?;

        tracing::info!(
            event_id = %recorded.event_id,
            user_id = %recorded.user_id,
            category = %recorded.ticket_category,
            "registration recorded"
        );
        Ok(recorded)
    }

    /// Resolves `event_id` and registers `identity` for it.
    ///
    /// # Errors
    ///
    /// Same as [`EventService::register`], plus
    /// [`AppError::EventNotFound`].
    pub async fn register_by_id(
        &self,
        identity: Option<&Identity>,
        event_id: EventId,
        category: &str,
    ) -> Result<Registration, AppError> {
        let event = self.get_event(event_id).await?;
        self.register(identity, &event, category).await
    }

    /// Writes a review of `event_id` by `identity`.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthenticated`] without an identity,
    /// [`AppError::Validation`] for empty text, or the store's failure.
    pub async fn post_review(
        &self,
        identity: Option<&Identity>,
        event_id: EventId,
        body: &str,
    ) -> Result<Review, AppError> {
        let identity = identity.ok_or_else(|| AppError::unauthenticated(LOGIN_TO_REVIEW))?;
        if body.is_empty() {
            return Err(AppError::validation(WRITE_REVIEW));
        }

        let review = self
            .store
            .create_review(NewReview {
                user_id: identity.user_id.clone(),
                event_id,
                body: body.to_string(),
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| log_store_failure("submit review", err))?;

        tracing::info!(%event_id, user_id = %identity.user_id, "review posted");
        Ok(review)
    }

    /// Reviews of one event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the store's failure.
    pub async fn reviews_for(&self, event_id: EventId) -> Result<Vec<Review>, AppError> {
        let mut reviews = self
            .store
            .list_reviews_by_event(event_id)
            .await
            .map_err(|err| log_store_failure("list reviews", err))?;
        reviews.sort_by_key(|r| r.created_at);
        Ok(reviews)
    }

    /// Events created by `organiser`, each with its registrations tallied
    /// by ticket category.
    ///
    /// # Errors
    ///
    /// Returns the store's failure.
    pub async fn organizer_overview(
        &self,
        organiser: &UserId,
    ) -> Result<Vec<OrganizerEvent>, AppError> {
        let mut events = self
            .store
            .list_events_by_creator(organiser)
            .await
            .map_err(|err| log_store_failure("list organiser events", err))?;
        sort_events(&mut events);

        let mut overview = Vec::with_capacity(events.len());
        for event in events {
            let registrations = self
                .store
                .list_registrations_by_event(event.id)
                .await
                .map_err(|err| log_store_failure("list event registrations", err))?;
            overview.push(OrganizerEvent {
                tallies: tally_by_category(&registrations),
                event,
            });
        }
        Ok(overview)
    }
}

fn log_store_failure(action: &str, err: StoreError) -> AppError {
    match &err {
        StoreError::Backend(message) => tracing::error!(action, error = %message, "store call failed"),
        other => tracing::warn!(action, error = %other, "store call rejected"),
    }
    err.into()
}
