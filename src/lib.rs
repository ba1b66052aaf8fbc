//! # event-desk
//!
//! Ticketed events, registrations and reviews over a pluggable identity
//! provider and event store.
//!
//! Organisers create events with free-text seat categories and prices.
//! Attendees browse and search them, register for a category and leave
//! reviews. Organisers see registrations tallied per category. Identity
//! and persistence are delegated to external collaborators behind the
//! [`identity::IdentityProvider`] and [`store::EventStore`] traits.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)          View flows (flows/)
//!     │                                   │
//!     ├── REST Handlers (api/)            │
//!     ├── WS auth-state push (ws/)        │
//!     │                                   │
//!     ├── IdentityGateway (identity/) ◄───┤
//!     │     └── IdentityProvider          │
//!     ├── EventService (service/)  ◄──────┘
//!     │     └── EventStore (store/)
//!     │           ├── in-memory
//!     │           └── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod flows;
pub mod identity;
pub mod server;
pub mod service;
pub mod store;
pub mod ws;
