//! WebSocket layer: auth-state push per session.
//!
//! The endpoint at `/ws?session=<id>` sends the session's current auth
//! state on connect and again on every sign-in or sign-out. Clients may
//! send `get_state` and `sign_out` commands.

pub mod connection;
pub mod handler;
pub mod messages;
