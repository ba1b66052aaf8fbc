//! The organiser dashboard: own events, per-category tallies, reviews.

use std::collections::{BTreeMap, HashMap};

use super::ViewContext;
use crate::domain::{EventId, Identity, Review};
use crate::error::AppError;
use crate::service::OrganizerEvent;

/// Lists the signed-in organiser's events with registration tallies and
/// shows reviews per event on demand.
///
/// Reviews are fetched once per event and cached for the life of the
/// dashboard.
#[derive(Debug)]
pub struct OrganizerDashboard {
    ctx: ViewContext,
    loading: bool,
    rows: Vec<OrganizerEvent>,
    reviews: HashMap<EventId, Vec<Review>>,
    showing_reviews: Option<EventId>,
}

impl OrganizerDashboard {
    /// A dashboard waiting for its first identity notification.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            loading: true,
            rows: Vec::new(),
            reviews: HashMap::new(),
            showing_reviews: None,
        }
    }

    /// Whether the first identity notification is still pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Handles an auth-state notification: fetches the organiser's events
    /// and tallies when signed in. Loading ends either way.
    ///
    /// # Errors
    ///
    /// Returns the store's failure; loading still ends.
    pub async fn on_auth_ready(&mut self, identity: Option<&Identity>) -> Result<(), AppError> {
        let result = match identity {
            Some(identity) => {
                match self.ctx.events().organizer_overview(&identity.user_id).await {
                    Ok(rows) => {
                        self.rows = rows;
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            None => Ok(()),
        };
        self.loading = false;
        result
    }

    /// Reads the session's identity and loads as [`Self::on_auth_ready`].
    ///
    /// # Errors
    ///
    /// Returns the gateway's or the store's failure.
    pub async fn load(&mut self) -> Result<(), AppError> {
        let identity = self.ctx.identity().await?;
        self.on_auth_ready(identity.as_ref()).await
    }

    /// Loads on the first pushed notification that carries an identity.
    ///
    /// Returns at once when the session is already signed in. Otherwise
    /// it waits for the gateway to push a sign-in. If the session closes
    /// first, loading ends with no rows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] for a closed session, or the
    /// store's failure.
    pub async fn load_on_sign_in(&mut self) -> Result<(), AppError> {
        let (current, mut changes) = self.ctx.gateway().subscribe(self.ctx.session()).await?;
        if let Some(identity) = current.identity() {
            return self.on_auth_ready(Some(identity)).await;
        }
        while let Some(state) = changes.next().await {
            if let Some(identity) = state.identity() {
                return self.on_auth_ready(Some(identity)).await;
            }
        }
        self.on_auth_ready(None).await
    }

    /// The organiser's events with their tallies.
    #[must_use]
    pub fn rows(&self) -> &[OrganizerEvent] {
        &self.rows
    }

    /// Category tallies for one of the organiser's events.
    #[must_use]
    pub fn tallies_for(&self, event_id: EventId) -> Option<&BTreeMap<String, u64>> {
        self.rows
            .iter()
            .find(|row| row.event.id == event_id)
            .map(|row| &row.tallies)
    }

    /// Opens the reviews dialog for `event_id`, fetching on first view.
    ///
    /// # Errors
    ///
    /// Returns the store's failure; nothing is cached then.
    pub async fn view_reviews(&mut self, event_id: EventId) -> Result<&[Review], AppError> {
        if !self.reviews.contains_key(&event_id) {
            let fetched = self.ctx.events().reviews_for(event_id).await?;
            self.reviews.insert(event_id, fetched);
        }
        self.showing_reviews = Some(event_id);
        Ok(self
            .reviews
            .get(&event_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Event whose reviews are showing.
    #[must_use]
    pub fn showing_reviews(&self) -> Option<EventId> {
        self.showing_reviews
    }

    /// Closes the reviews dialog. The cache is kept.
    pub fn close_reviews(&mut self) {
        self.showing_reviews = None;
    }
}
