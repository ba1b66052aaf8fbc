//! Event browsing: list, search, register and review.

use std::collections::HashSet;

use super::ViewContext;
use crate::domain::{Event, EventId, Registration, Review, display_price};
use crate::error::AppError;
use crate::service::filter_by_name;

/// The ticket selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TicketSelection {
    /// Not showing.
    #[default]
    Closed,
    /// Showing for one event, nothing picked yet.
    Open {
        /// Event being registered for.
        event_id: EventId,
    },
    /// A category has been picked.
    CategorySelected {
        /// Event being registered for.
        event_id: EventId,
        /// Picked category.
        category: String,
        /// Price of the first seat tier with that name, if any.
        price: Option<String>,
    },
}

impl TicketSelection {
    /// Event the selector is showing for.
    #[must_use]
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            Self::Closed => None,
            Self::Open { event_id } | Self::CategorySelected { event_id, .. } => Some(*event_id),
        }
    }

    /// Price text as displayed: the price, or `"N/A"`.
    #[must_use]
    pub fn displayed_price(&self) -> String {
        match self {
            Self::CategorySelected { price, .. } => display_price(price.as_deref()),
            _ => display_price(None),
        }
    }
}

/// The review dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReviewComposer {
    /// Not showing.
    #[default]
    Closed,
    /// Showing for one event.
    Open {
        /// Event under review.
        event_id: EventId,
        /// Text typed so far.
        text: String,
    },
}

/// The attendee dashboard.
#[derive(Debug)]
pub struct BrowsingFlow {
    ctx: ViewContext,
    events: Vec<Event>,
    registered: HashSet<EventId>,
    query: String,
    selection: TicketSelection,
    composer: ReviewComposer,
}

impl BrowsingFlow {
    /// An empty, unloaded dashboard.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            events: Vec::new(),
            registered: HashSet::new(),
            query: String::new(),
            selection: TicketSelection::Closed,
            composer: ReviewComposer::Closed,
        }
    }

    /// Fetches every event and, when signed in, the user's registrations.
    ///
    /// # Errors
    ///
    /// Returns the first failed fetch; earlier state is kept then.
    pub async fn load(&mut self) -> Result<(), AppError> {
        let events = self.ctx.events().list_events().await?;
        let registered = match self.ctx.identity().await? {
            Some(identity) => {
                self.ctx
                    .events()
                    .registered_event_ids(&identity.user_id)
                    .await?
            }
            None => HashSet::new(),
        };
        self.events = events;
        self.registered = registered;
        Ok(())
    }

    /// Every loaded event.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Replaces the search text.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The search text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Loaded events whose name contains the search text, ignoring case.
    #[must_use]
    pub fn visible(&self) -> Vec<&Event> {
        filter_by_name(&self.events, &self.query)
    }

    /// Whether the user is known to hold a registration for `event_id`.
    #[must_use]
    pub fn is_registered(&self, event_id: EventId) -> bool {
        self.registered.contains(&event_id)
    }

    /// Ticket selector state.
    #[must_use]
    pub fn selection(&self) -> &TicketSelection {
        &self.selection
    }

    /// Opens the ticket selector for a loaded event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EventNotFound`] if the event is not loaded.
    pub fn open_ticket_selector(&mut self, event_id: EventId) -> Result<(), AppError> {
        self.loaded(event_id)?;
        self.selection = TicketSelection::Open { event_id };
        Ok(())
    }

    /// Category names offered by the open selector, in seat order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        self.selection
            .event_id()
            .and_then(|id| self.events.iter().find(|e| e.id == id))
            .map(|event| event.seats.iter().map(|s| s.category.as_str()).collect())
            .unwrap_or_default()
    }

    /// Picks a category in the open selector. Categories not on the event
    /// are accepted and leave the price unset.
    pub fn select_category(&mut self, category: &str) {
        let Some(event_id) = self.selection.event_id() else {
            return;
        };
        let price = self
            .events
            .iter()
            .find(|e| e.id == event_id)
            .and_then(|e| e.price_for(category))
            .map(str::to_string);
        self.selection = TicketSelection::CategorySelected {
            event_id,
            category: category.to_string(),
            price,
        };
    }

    /// Closes the ticket selector without registering.
    pub fn close_ticket_selector(&mut self) {
        self.selection = TicketSelection::Closed;
    }

    /// Registers for the open selector's event and category.
    ///
    /// On success the event is marked registered and the selector closes.
    /// On failure the selector stays as it was.
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] when the selector is closed or no category
    /// is picked, [`AppError::Unauthenticated`] when signed out, or the
    /// store's failure.
    pub async fn confirm_registration(&mut self) -> Result<Registration, AppError> {
        let (event_id, category) = match &self.selection {
            TicketSelection::Closed => {
                return Err(AppError::validation("No event selected"));
            }
            TicketSelection::Open { event_id } => (*event_id, ""),
            TicketSelection::CategorySelected {
                event_id, category, ..
            } => (*event_id, category.as_str()),
        };
        let event = self.loaded(event_id)?;
        let identity = self.ctx.identity().await?;
        let registration = self
            .ctx
            .events()
            .register(identity.as_ref(), event, category)
            .await?;

        self.registered.insert(event_id);
        self.selection = TicketSelection::Closed;
        Ok(registration)
    }

    /// Review dialog state.
    #[must_use]
    pub fn composer(&self) -> &ReviewComposer {
        &self.composer
    }

    /// Opens the review dialog for a loaded event with empty text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EventNotFound`] if the event is not loaded.
    pub fn open_review(&mut self, event_id: EventId) -> Result<(), AppError> {
        self.loaded(event_id)?;
        self.composer = ReviewComposer::Open {
            event_id,
            text: String::new(),
        };
        Ok(())
    }

    /// Replaces the review text. Ignored while the dialog is closed.
    pub fn set_review_text(&mut self, value: impl Into<String>) {
        if let ReviewComposer::Open { text, .. } = &mut self.composer {
            *text = value.into();
        }
    }

    /// Closes the review dialog and drops the text.
    pub fn close_review(&mut self) {
        self.composer = ReviewComposer::Closed;
    }

    /// Writes the review. On success the dialog closes and the text is
    /// cleared; on failure both are kept.
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] when closed or empty,
    /// [`AppError::Unauthenticated`] when signed out, or the store's
    /// failure.
    pub async fn submit_review(&mut self) -> Result<Review, AppError> {
        let ReviewComposer::Open { event_id, text } = &self.composer else {
            return Err(AppError::validation("No event selected"));
        };
        let identity = self.ctx.identity().await?;
        let review = self
            .ctx
            .events()
            .post_review(identity.as_ref(), *event_id, text)
            .await?;
        self.composer = ReviewComposer::Closed;
        Ok(review)
    }

    fn loaded(&self, event_id: EventId) -> Result<&Event, AppError> {
        self.events
            .iter()
            .find(|e| e.id == event_id)
            .ok_or(AppError::EventNotFound(event_id))
    }
}
