//! Ticket registrations. Append-only: never updated or deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, RegistrationId, UserId};

/// A user's registration for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Registration {
    /// Store-assigned identifier.
    pub id: RegistrationId,
    /// Registering user.
    pub user_id: UserId,
    /// Event registered for.
    pub event_id: EventId,
    /// Seat category chosen at registration time.
    pub ticket_category: String,
    /// Price copied from the event when registering; `None` when the
    /// chosen category had no matching seat.
    pub price: Option<String>,
    /// When the registration was written.
    pub registered_at: DateTime<Utc>,
}

/// Insert payload for a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    /// Registering user.
    pub user_id: UserId,
    /// Event registered for.
    pub event_id: EventId,
    /// Chosen seat category.
    pub ticket_category: String,
    /// Copied price, if the category matched a seat.
    pub price: Option<String>,
    /// Write timestamp.
    pub registered_at: DateTime<Utc>,
}

impl NewRegistration {
    /// Materialises the stored record under `id`.
    #[must_use]
    pub fn into_registration(self, id: RegistrationId) -> Registration {
        Registration {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            ticket_category: self.ticket_category,
            price: self.price,
            registered_at: self.registered_at,
        }
    }
}

/// Counts registrations per recorded ticket category.
///
/// Categories nobody registered for are absent rather than zero.
#[must_use]
pub fn tally_by_category<'a, I>(registrations: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Registration>,
{
    let mut tally = BTreeMap::new();
    for registration in registrations {
        *tally
            .entry(registration.ticket_category.clone())
            .or_insert(0) += 1;
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(category: &str) -> Registration {
        NewRegistration {
            user_id: UserId::new("u"),
            event_id: EventId::new(),
            ticket_category: category.to_string(),
            price: None,
            registered_at: Utc::now(),
        }
        .into_registration(RegistrationId::new())
    }

    #[test]
    fn tally_counts_each_category() {
        let regs = vec![
            registration("VIP"),
            registration("VIP"),
            registration("General"),
        ];
        let tally = tally_by_category(&regs);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.get("VIP"), Some(&2));
        assert_eq!(tally.get("General"), Some(&1));
        assert_eq!(tally.get("Balcony"), None);
    }

    #[test]
    fn tally_of_nothing_is_empty() {
        let tally = tally_by_category(&Vec::<Registration>::new());
        assert!(tally.is_empty());
    }
}
