//! The boundary around the pure engine.
//!
//! Everything with side effects lives here: resolving who is acting,
//! validating request shape, loading and storing deals, and serializing
//! concurrent writers with an optimistic version check. Logging happens
//! at this layer only.

pub mod authorization;
pub mod effect;
pub mod service;
pub mod store;

pub use authorization::{AccessToken, AuthorizationError, Authorizer, StaticAuthorizer};
pub use effect::{transition_effect, DealEnv};
pub use service::{DealService, DealTransitioned, ServiceError};
pub use store::{DealStore, InMemoryDealStore, StoreError};
