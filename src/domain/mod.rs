//! Domain layer: identifiers and the records mirrored from the store.
//!
//! Events, registrations and reviews are plain records. Registrations and
//! reviews are append-only; an event is only ever mutated by changing its
//! registration count. Session auth state lives here too so that the
//! identity gateway and the views share one vocabulary.

pub mod event;
pub mod ids;
pub mod registration;
pub mod review;
pub mod session;

pub use event::{Event, EventKind, NewEvent, SeatCategory, display_price, price_for};
pub use ids::{EventId, RegistrationId, ReviewId, SessionId, UserId};
pub use registration::{NewRegistration, Registration, tally_by_category};
pub use review::{NewReview, Review};
pub use session::{AuthMethod, AuthState, Identity};
