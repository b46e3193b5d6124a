//! Core deal workflow types.
//!
//! This module contains the pure data model of the workflow:
//! - The closed state set and its lookup helpers
//! - Events and the actor identity attached to them
//! - The deal aggregate and its append-only history
//! - Guard predicates and the compile-time transition table
//!
//! Nothing in this module performs I/O.

pub(crate) mod deal;
mod event;
mod guard;
mod history;
mod state;
pub mod table;

pub use deal::{DealContext, DealId, DealTermsError, IntegrityError, NewDeal};
pub use event::{ActorId, DealEvent, DealEventWithActor, EventKind};
pub use guard::{can_archive, can_cancel, can_transition_backward, can_transition_forward};
pub use guard::{Guard, GuardSet};
pub use history::{StateHistory, TransitionRecord};
pub use state::{
    can_cancel_from_state, is_terminal_state, next_state, previous_state, DealState, State,
    UnknownState,
};
pub use table::{EdgeKind, Target, TransitionSpec};
