//! Errors returned by the transition engine.

use crate::core::{DealState, EventKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable category of a [`TransitionError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionErrorKind {
    IllegalTransition,
    InvalidBackwardTarget,
    MissingActor,
    GuardRejected,
}

impl TransitionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IllegalTransition => "illegal_transition",
            Self::InvalidBackwardTarget => "invalid_backward_target",
            Self::MissingActor => "missing_actor",
            Self::GuardRejected => "guard_rejected",
        }
    }
}

impl fmt::Display for TransitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected transition. No mutation has happened when one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("event {event} is not permitted from state '{state}'")]
    IllegalTransition { state: DealState, event: EventKind },

    #[error("cannot go back from '{state}' to '{target}'{}", expected_suffix(.expected))]
    InvalidBackwardTarget {
        state: DealState,
        target: DealState,
        expected: Option<DealState>,
    },

    #[error("event {event} reached the engine without an acting identity (state '{state}')")]
    MissingActor { state: DealState, event: EventKind },

    #[error("guard '{guard}' rejected {event} from '{state}'")]
    GuardRejected {
        state: DealState,
        event: EventKind,
        guard: String,
    },
}

fn expected_suffix(expected: &Option<DealState>) -> String {
    match expected {
        Some(state) => format!(" (only '{state}' is allowed)"),
        None => " (no earlier state exists)".to_string(),
    }
}

impl TransitionError {
    pub fn kind(&self) -> TransitionErrorKind {
        match self {
            Self::IllegalTransition { .. } => TransitionErrorKind::IllegalTransition,
            Self::InvalidBackwardTarget { .. } => TransitionErrorKind::InvalidBackwardTarget,
            Self::MissingActor { .. } => TransitionErrorKind::MissingActor,
            Self::GuardRejected { .. } => TransitionErrorKind::GuardRejected,
        }
    }

    /// State the deal was in when the event was rejected.
    pub fn state(&self) -> DealState {
        match self {
            Self::IllegalTransition { state, .. }
            | Self::InvalidBackwardTarget { state, .. }
            | Self::MissingActor { state, .. }
            | Self::GuardRejected { state, .. } => *state,
        }
    }

    pub fn event(&self) -> EventKind {
        match self {
            Self::InvalidBackwardTarget { .. } => EventKind::GoBack,
            Self::IllegalTransition { event, .. }
            | Self::MissingActor { event, .. }
            | Self::GuardRejected { event, .. } => *event,
        }
    }

    /// Integration errors the caller must treat as fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingActor { .. })
    }

    /// Engine errors are deterministic; repeating the same request yields the
    /// same answer.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
