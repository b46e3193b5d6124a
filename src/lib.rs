//! Deal workflow: a pure state machine for fractional mortgage purchases
//!
//! A deal moves from `locked` through lawyer confirmation, document signing,
//! fund transfer and verification to `completed`, can be cancelled from any
//! non-terminal step and is finally `archived`. The crate follows the
//! "pure core, imperative shell" split: the engine is a pure function over
//! immutable values, and everything that touches storage, identity or logs
//! lives in the boundary.
//!
//! # Layout
//!
//! - [`core`]: states, events, the deal aggregate, history, guards and the
//!   transition table
//! - [`engine`]: `DealWorkflow`, the transition function
//! - [`enforcement`]: request-shape validation with accumulated violations
//! - [`snapshot`]: versioned JSON and binary snapshots with integrity checks
//! - [`config`]: `WorkflowConfig` from JSON or environment
//! - [`boundary`]: store and authorizer seams, `DealService`, and an
//!   effect-based entry point
//!
//! # Example
//!
//! ```rust
//! use deal_workflow::boundary::{AccessToken, DealService, InMemoryDealStore, StaticAuthorizer};
//! use deal_workflow::core::{ActorId, DealId, DealState, NewDeal};
//! use std::sync::Arc;
//!
//! let token = AccessToken::new("token-1");
//! let authorizer = StaticAuthorizer::new().grant(token.clone(), ActorId::new("admin-1"));
//! let service = DealService::new(Arc::new(InMemoryDealStore::new()), Arc::new(authorizer));
//!
//! let deal = service
//!     .create_deal(
//!         &token,
//!         NewDeal {
//!             deal_id: DealId::new("deal-1"),
//!             lock_request_id: "lock-1".into(),
//!             listing_id: "listing-1".into(),
//!             mortgage_id: "mortgage-1".into(),
//!             investor_id: "investor-1".into(),
//!             purchase_percentage: 10.0,
//!             deal_value: 50_000.0,
//!         },
//!     )
//!     .unwrap();
//!
//! let step = service.confirm_lawyer(deal.deal_id(), &token, None).unwrap();
//! assert_eq!(step.deal.current_state(), DealState::PendingLawyer);
//! ```

pub mod boundary;
pub mod config;
pub mod core;
pub mod enforcement;
pub mod engine;
pub mod snapshot;

// Re-export commonly used types
pub use self::core::{
    ActorId, DealContext, DealEvent, DealEventWithActor, DealId, DealState, EventKind, NewDeal,
    State, StateHistory, TransitionRecord,
};
pub use engine::{DealWorkflow, TransitionError, TransitionErrorKind};
