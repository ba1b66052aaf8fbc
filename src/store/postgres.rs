//! PostgreSQL implementation of the event store.
//!
//! Seat categories are stored as a JSONB array on the event row. The
//! registration counter is bumped with `registrations = registrations + 1`
//! in SQL, never read-modify-written from here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

use super::{EventStore, RegistrationPolicy, StoreError};
use crate::config::DatabaseConfig;
use crate::domain::{
    Event, EventId, EventKind, NewEvent, NewRegistration, NewReview, Registration,
    RegistrationId, Review, ReviewId, SeatCategory, UserId,
};

const EVENT_COLUMNS: &str = "id, name, description, kind, audience, event_date, creator_id, \
     registrations, created_at, seats";

const REGISTRATION_COLUMNS: &str = "id, user_id, event_id, ticket_category, price, registered_at";

const REVIEW_COLUMNS: &str = "id, user_id, event_id, body, created_at";

/// PostgreSQL-backed event store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: String,
    kind: String,
    audience: String,
    event_date: String,
    creator_id: String,
    registrations: i64,
    created_at: DateTime<Utc>,
    seats: Json<Vec<SeatCategory>>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let kind = EventKind::from_label(&row.kind)
            .ok_or_else(|| StoreError::Backend(format!("unknown event kind: {}", row.kind)))?;
        Ok(Self {
            id: EventId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            kind,
            audience: row.audience,
            date: row.event_date,
            creator: UserId::new(row.creator_id),
            registrations: u64::try_from(row.registrations).unwrap_or(0),
            created_at: row.created_at,
            seats: row.seats.0,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RegistrationRow {
    id: Uuid,
    user_id: String,
    event_id: Uuid,
    ticket_category: String,
    price: Option<String>,
    registered_at: DateTime<Utc>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            id: RegistrationId::from_uuid(row.id),
            user_id: UserId::new(row.user_id),
            event_id: EventId::from_uuid(row.event_id),
            ticket_category: row.ticket_category,
            price: row.price,
            registered_at: row.registered_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: String,
    event_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::from_uuid(row.id),
            user_id: UserId::new(row.user_id),
            event_id: EventId::from_uuid(row.event_id),
            body: row.body,
            created_at: row.created_at,
        }
    }
}

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl PostgresEventStore {
    /// Creates a store on an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool with the configured limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(backend)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(backend)
    }
}

fn to_events(rows: Vec<EventRow>) -> Result<Vec<Event>, StoreError> {
    rows.into_iter().map(Event::try_from).collect()
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn create_event(&self, event: NewEvent) -> Result<EventId, StoreError> {
        let id = EventId::new();
        sqlx::query(
            "INSERT INTO events (id, name, description, kind, audience, event_date, creator_id, \
             registrations, created_at, seats) VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9)",
        )
        .bind(*id.as_uuid())
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.kind.label())
        .bind(&event.audience)
        .bind(&event.date)
        .bind(event.creator.as_str())
        .bind(event.created_at)
        .bind(Json(&event.seats))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(id)
    }

    async fn get_event(&self, id: EventId) -> Result<Event, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(StoreError::EventNotFound(id))?;
        Event::try_from(row)
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events");
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        to_events(rows)
    }

    async fn list_events_by_creator(&self, creator: &UserId) -> Result<Vec<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE creator_id = $1");
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(creator.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        to_events(rows)
    }

    async fn increment_registration_count(&self, id: EventId) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE events SET registrations = registrations + 1 WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::EventNotFound(id));
        }
        Ok(())
    }

    async fn decrement_registration_count(&self, id: EventId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE events SET registrations = GREATEST(registrations - 1, 0) WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::EventNotFound(id));
        }
        Ok(())
    }

    async fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> Result<Registration, StoreError> {
        let id = RegistrationId::new();
        sqlx::query(
            "INSERT INTO registrations (id, user_id, event_id, ticket_category, price, registered_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*id.as_uuid())
        .bind(registration.user_id.as_str())
        .bind(*registration.event_id.as_uuid())
        .bind(&registration.ticket_category)
        .bind(registration.price.as_deref())
        .bind(registration.registered_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(registration.into_registration(id))
    }

    async fn list_registrations_by_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Registration>, StoreError> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE user_id = $1");
        let rows = sqlx::query_as::<_, RegistrationRow>(&sql)
            .bind(user.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Registration::from).collect())
    }

    async fn list_registrations_by_event(
        &self,
        event: EventId,
    ) -> Result<Vec<Registration>, StoreError> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE event_id = $1");
        let rows = sqlx::query_as::<_, RegistrationRow>(&sql)
            .bind(*event.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Registration::from).collect())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let id = ReviewId::new();
        sqlx::query(
            "INSERT INTO reviews (id, user_id, event_id, body, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*id.as_uuid())
        .bind(review.user_id.as_str())
        .bind(*review.event_id.as_uuid())
        .bind(&review.body)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(review.into_review(id))
    }

    async fn list_reviews_by_event(&self, event: EventId) -> Result<Vec<Review>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE event_id = $1");
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(*event.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Counter bump, duplicate check and insert in one transaction. The
    /// `UPDATE` takes the event's row lock first, which serializes
    /// concurrent registrations for the same event.
    async fn record_registration(
        &self,
        registration: NewRegistration,
        policy: RegistrationPolicy,
    ) -> Result<Registration, StoreError> {
        let event_id = registration.event_id;
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let updated =
            sqlx::query("UPDATE events SET registrations = registrations + 1 WHERE id = $1")
                .bind(*event_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::EventNotFound(event_id));
        }

        if policy == RegistrationPolicy::OnePerUser {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM registrations WHERE user_id = $1 AND event_id = $2)",
            )
            .bind(registration.user_id.as_str())
            .bind(*event_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
            if exists {
                return Err(StoreError::DuplicateRegistration(event_id));
            }
        }

        let id = RegistrationId::new();
        sqlx::query(
            "INSERT INTO registrations (id, user_id, event_id, ticket_category, price, registered_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*id.as_uuid())
        .bind(registration.user_id.as_str())
        .bind(*event_id.as_uuid())
        .bind(&registration.ticket_category)
        .bind(registration.price.as_deref())
        .bind(registration.registered_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(registration.into_registration(id))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    async fn connect() -> PostgresEventStore {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            panic!("DATABASE_URL must be set for PostgreSQL tests");
        };
        let config = DatabaseConfig {
            url,
            max_connections: 2,
            min_connections: 1,
            connect_timeout_secs: 5,
        };
        let Ok(store) = PostgresEventStore::connect(&config).await else {
            panic!("connect failed");
        };
        let Ok(()) = store.migrate().await else {
            panic!("migration failed");
        };
        store
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database in DATABASE_URL"]
    async fn registration_round_trip() {
        let store = connect().await;
        let creator = UserId::new(format!("organiser-{}", Uuid::new_v4()));
        let new_event = NewEvent {
            name: "Launch".to_string(),
            description: "Product launch".to_string(),
            kind: EventKind::Virtual,
            audience: "Everyone".to_string(),
            date: "2025-01-01".to_string(),
            creator: creator.clone(),
            created_at: Utc::now(),
            seats: vec![SeatCategory::new("GA", "100")],
        };
        let Ok(id) = store.create_event(new_event).await else {
            panic!("create failed");
        };

        let registration = NewRegistration {
            user_id: UserId::new("attendee"),
            event_id: id,
            ticket_category: "GA".to_string(),
            price: Some("100".to_string()),
            registered_at: Utc::now(),
        };
        let policy = RegistrationPolicy::OnePerUser;
        assert!(store.record_registration(registration.clone(), policy).await.is_ok());
        assert_eq!(
            store.record_registration(registration, policy).await,
            Err(StoreError::DuplicateRegistration(id))
        );

        let Ok(event) = store.get_event(id).await else {
            panic!("event missing");
        };
        assert_eq!(event.registrations, 1);
        assert_eq!(event.kind, EventKind::Virtual);
        assert_eq!(event.seats, vec![SeatCategory::new("GA", "100")]);

        let mine = store.list_events_by_creator(&creator).await;
        assert_eq!(mine.map(|v| v.len()), Ok(1));
        let regs = store.list_registrations_by_event(id).await;
        assert_eq!(regs.map(|v| v.len()), Ok(1));
    }
}
