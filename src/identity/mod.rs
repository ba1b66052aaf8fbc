//! Identity gateway: sign-in, sign-up, federated sign-in, sign-out and
//! auth-state notifications.
//!
//! Credential storage, password rules and token issuance belong to an
//! [`IdentityProvider`]. Two are shipped: [`InMemoryIdentityProvider`]
//! for development and tests, and [`IdentityToolkitProvider`] for the
//! hosted Identity Toolkit REST API.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod provider;
pub mod toolkit;

pub use error::IdentityError;
pub use gateway::{AuthChanges, AuthSubscription, IdentityGateway};
pub use memory::InMemoryIdentityProvider;
pub use provider::{CompletedFlow, FederatedCredential, FederatedFlow, IdentityProvider};
pub use toolkit::{IdentityToolkitProvider, ToolkitSettings};
