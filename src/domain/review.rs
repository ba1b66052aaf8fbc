//! Event reviews. Append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, ReviewId, UserId};

/// Free-text feedback left on an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    /// Store-assigned identifier.
    pub id: ReviewId,
    /// Author.
    pub user_id: UserId,
    /// Reviewed event.
    pub event_id: EventId,
    /// Review text.
    #[serde(rename = "review")]
    pub body: String,
    /// When the review was written.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    /// Author.
    pub user_id: UserId,
    /// Reviewed event.
    pub event_id: EventId,
    /// Review text.
    pub body: String,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewReview {
    /// Materialises the stored record under `id`.
    #[must_use]
    pub fn into_review(self, id: ReviewId) -> Review {
        Review {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            body: self.body,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_body_is_serialized_as_review() {
        let review = NewReview {
            user_id: UserId::new("u"),
            event_id: EventId::new(),
            body: "great".to_string(),
            created_at: Utc::now(),
        }
        .into_review(ReviewId::new());
        let json = serde_json::to_value(&review).unwrap_or_default();
        assert_eq!(json.get("review").and_then(|v| v.as_str()), Some("great"));
        assert!(json.get("body").is_none());
    }
}
