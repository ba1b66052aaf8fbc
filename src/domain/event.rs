//! Event records and their seat categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, UserId};

/// Whether an event happens at a venue or online.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EventKind {
    /// Attended at a physical venue.
    #[default]
    #[serde(rename = "In Person")]
    InPerson,
    /// Attended online.
    #[serde(rename = "Virtual")]
    Virtual,
}

impl EventKind {
    /// Returns the label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InPerson => "In Person",
            Self::Virtual => "Virtual",
        }
    }

    /// Parses a label produced by [`EventKind::label`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "In Person" => Some(Self::InPerson),
            "Virtual" => Some(Self::Virtual),
            _ => None,
        }
    }
}

/// One ticket tier offered by an event.
///
/// Both fields are free text exactly as the organiser typed them. The
/// price is not parsed, so `"100"`, `"free"` and `""` are all accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SeatCategory {
    /// Category name, e.g. `"VIP"`.
    pub category: String,
    /// Price text, e.g. `"100"`.
    pub price: String,
}

impl SeatCategory {
    /// Creates a seat category.
    #[must_use]
    pub fn new(category: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            price: price.into(),
        }
    }
}

/// Looks up the price of the first seat whose category matches exactly.
///
/// Duplicate category names are allowed on one event; only the first one
/// is ever consulted here.
#[must_use]
pub fn price_for<'a>(seats: &'a [SeatCategory], category: &str) -> Option<&'a str> {
    seats
        .iter()
        .find(|seat| seat.category == category)
        .map(|seat| seat.price.as_str())
}

/// Renders an optional price the way the ticket selector shows it.
///
/// Missing and empty prices both render as `"N/A"`.
#[must_use]
pub fn display_price(price: Option<&str>) -> String {
    match price {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "N/A".to_string(),
    }
}

/// An event as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Store-assigned identifier.
    pub id: EventId,
    /// Display name; the only field search looks at.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// In person or virtual.
    pub kind: EventKind,
    /// Free-text target audience.
    pub audience: String,
    /// Event date as entered (`YYYY-MM-DD` from a date input).
    pub date: String,
    /// Identity of the organiser who created the event.
    pub creator: UserId,
    /// Number of registrations recorded against this event.
    pub registrations: u64,
    /// When the event was written.
    pub created_at: DateTime<Utc>,
    /// Ordered ticket tiers.
    pub seats: Vec<SeatCategory>,
}

impl Event {
    /// Price of the first seat tier named `category`, if any.
    #[must_use]
    pub fn price_for(&self, category: &str) -> Option<&str> {
        price_for(&self.seats, category)
    }

    /// Whether the event name contains `needle`, ignoring case.
    ///
    /// An empty needle matches every event.
    #[must_use]
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Insert payload for a new event.
///
/// Carries no registration count: the store always starts it at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// In person or virtual.
    pub kind: EventKind,
    /// Free-text target audience.
    pub audience: String,
    /// Event date as entered.
    pub date: String,
    /// Organiser identity.
    pub creator: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Ordered ticket tiers.
    pub seats: Vec<SeatCategory>,
}

impl NewEvent {
    /// Materialises the stored record under `id` with a zero count.
    #[must_use]
    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            name: self.name,
            description: self.description,
            kind: self.kind,
            audience: self.audience,
            date: self.date,
            creator: self.creator,
            registrations: 0,
            created_at: self.created_at,
            seats: self.seats,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn event_named(name: &str) -> Event {
        NewEvent {
            name: name.to_string(),
            description: "d".to_string(),
            kind: EventKind::Virtual,
            audience: "all".to_string(),
            date: "2025-01-01".to_string(),
            creator: UserId::new("u1"),
            created_at: Utc::now(),
            seats: vec![
                SeatCategory::new("VIP", "500"),
                SeatCategory::new("GA", "100"),
                SeatCategory::new("VIP", "900"),
            ],
        }
        .into_event(EventId::new())
    }

    #[test]
    fn new_event_starts_with_zero_registrations() {
        assert_eq!(event_named("Launch").registrations, 0);
    }

    #[test]
    fn first_matching_seat_wins() {
        let event = event_named("Launch");
        assert_eq!(event.price_for("VIP"), Some("500"));
        assert_eq!(event.price_for("GA"), Some("100"));
        assert_eq!(event.price_for("ga"), None);
    }

    #[test]
    fn missing_or_empty_price_displays_na() {
        assert_eq!(display_price(None), "N/A");
        assert_eq!(display_price(Some("")), "N/A");
        assert_eq!(display_price(Some("100")), "100");
    }

    #[test]
    fn name_match_ignores_case() {
        let event = event_named("Rust Meetup");
        assert!(event.name_matches("rust"));
        assert!(event.name_matches("MEET"));
        assert!(event.name_matches(""));
        assert!(!event.name_matches("conf"));
    }

    #[test]
    fn kind_uses_display_labels_on_the_wire() {
        let Ok(json) = serde_json::to_string(&EventKind::InPerson) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"In Person\"");
        let Ok(kind) = serde_json::from_str::<EventKind>("\"Virtual\"") else {
            panic!("deserialization failed");
        };
        assert_eq!(kind, EventKind::Virtual);
        assert_eq!(EventKind::default().label(), "In Person");
        assert_eq!(EventKind::from_label("Virtual"), Some(EventKind::Virtual));
        assert_eq!(EventKind::from_label("virtual"), None);
    }
}
