//! The event creation form.

use super::ViewContext;
use crate::domain::{EventId, SeatCategory};
use crate::service::{EVENT_CREATED, EventDraft};

/// Where a submission stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    /// The form is being filled in.
    #[default]
    Editing,
    /// A write is in flight.
    Submitting,
    /// The event was written; the form has been reset.
    Succeeded {
        /// Id of the new event.
        event_id: EventId,
        /// Confirmation text.
        message: String,
    },
    /// The write was refused; the form is kept for another try.
    Failed(String),
}

/// Collects event details and a growable list of seat rows, then writes
/// one event.
#[derive(Debug)]
pub struct EventCreationFlow {
    ctx: ViewContext,
    draft: EventDraft,
    state: SubmissionState,
}

impl EventCreationFlow {
    /// A blank form with one blank seat row.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            draft: EventDraft::default(),
            state: SubmissionState::Editing,
        }
    }

    /// The form contents.
    #[must_use]
    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    /// Mutable access to the form's text fields. Editing puts a finished
    /// submission back into [`SubmissionState::Editing`].
    pub fn draft_mut(&mut self) -> &mut EventDraft {
        self.state = SubmissionState::Editing;
        &mut self.draft
    }

    /// Appends a blank seat row. Existing rows are untouched.
    pub fn add_seat(&mut self) {
        self.draft_mut().seats.push(SeatCategory::default());
    }

    /// Overwrites seat row `index`. Returns `false` if there is no such row.
    pub fn set_seat(&mut self, index: usize, category: &str, price: &str) -> bool {
        match self.draft_mut().seats.get_mut(index) {
            Some(seat) => {
                *seat = SeatCategory::new(category, price);
                true
            }
            None => false,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Validates and writes the event.
    ///
    /// On success the form resets to its blank state. On failure the
    /// error text is kept verbatim and the form is left as typed.
    pub async fn submit(&mut self) -> &SubmissionState {
        self.state = SubmissionState::Submitting;

        let result = match self.ctx.identity().await {
            Ok(identity) => {
                self.ctx
                    .events()
                    .create_event(identity.as_ref(), self.draft.clone())
                    .await
            }
            Err(err) => Err(err),
        };

        self.state = match result {
            Ok(event_id) => {
                self.draft = EventDraft::default();
                SubmissionState::Succeeded {
                    event_id,
                    message: EVENT_CREATED.to_string(),
                }
            }
            Err(err) => SubmissionState::Failed(err.to_string()),
        };
        &self.state
    }
}
