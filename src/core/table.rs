//! The transition table.
//!
//! An immutable, compile-time list of every legal `(state, event kind)`
//! edge. A pair that has no row is an illegal transition.

use super::event::EventKind;
use super::event::EventKind as E;
use super::state::DealState;
use super::state::DealState as S;

/// Category of an edge; selects the default guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Forward,
    Backward,
    Cancel,
    Archive,
}

/// How the target state of an edge is determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Fixed by the event kind.
    Fixed(DealState),
    /// Caller-supplied, and must equal the canonical predecessor.
    Predecessor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionSpec {
    pub edge: EdgeKind,
    pub target: Target,
}

impl TransitionSpec {
    const fn forward(to: DealState) -> Self {
        Self {
            edge: EdgeKind::Forward,
            target: Target::Fixed(to),
        }
    }

    const fn backward() -> Self {
        Self {
            edge: EdgeKind::Backward,
            target: Target::Predecessor,
        }
    }

    const fn cancel() -> Self {
        Self {
            edge: EdgeKind::Cancel,
            target: Target::Fixed(DealState::Cancelled),
        }
    }

    const fn archive() -> Self {
        Self {
            edge: EdgeKind::Archive,
            target: Target::Fixed(DealState::Archived),
        }
    }
}

pub type TransitionRow = (DealState, EventKind, TransitionSpec);

/// Every legal edge.
///
/// `GO_BACK` is listed for `locked` as well: the predecessor check is what
/// rejects it there, so callers see `invalid_backward_target` rather than
/// `illegal_transition`.
pub const TRANSITIONS: &[TransitionRow] = &[
    // locked
    (S::Locked, E::ConfirmLawyer, TransitionSpec::forward(S::PendingLawyer)),
    (S::Locked, E::GoBack, TransitionSpec::backward()),
    (S::Locked, E::Cancel, TransitionSpec::cancel()),
    // pending_lawyer
    (S::PendingLawyer, E::CompleteDocs, TransitionSpec::forward(S::PendingDocs)),
    (S::PendingLawyer, E::GoBack, TransitionSpec::backward()),
    (S::PendingLawyer, E::Cancel, TransitionSpec::cancel()),
    // pending_docs
    (S::PendingDocs, E::ReceiveFunds, TransitionSpec::forward(S::PendingTransfer)),
    (S::PendingDocs, E::GoBack, TransitionSpec::backward()),
    (S::PendingDocs, E::Cancel, TransitionSpec::cancel()),
    // pending_transfer
    (S::PendingTransfer, E::VerifyFunds, TransitionSpec::forward(S::PendingVerification)),
    (S::PendingTransfer, E::GoBack, TransitionSpec::backward()),
    (S::PendingTransfer, E::Cancel, TransitionSpec::cancel()),
    // pending_verification
    (S::PendingVerification, E::CompleteDeal, TransitionSpec::forward(S::Completed)),
    (S::PendingVerification, E::GoBack, TransitionSpec::backward()),
    (S::PendingVerification, E::Cancel, TransitionSpec::cancel()),
    // terminal
    (S::Completed, E::Archive, TransitionSpec::archive()),
    (S::Cancelled, E::Archive, TransitionSpec::archive()),
];

/// Edge for `(state, kind)`, or `None` if the pair is illegal.
pub fn lookup(state: DealState, kind: EventKind) -> Option<TransitionSpec> {
    TRANSITIONS
        .iter()
        .find(|(from, event, _)| *from == state && *event == kind)
        .map(|(_, _, spec)| *spec)
}

/// Whether some row moves `from` to `to`.
///
/// A predecessor row only permits the step to `from.previous()`.
pub fn permits(from: DealState, to: DealState) -> bool {
    TRANSITIONS
        .iter()
        .filter(|(state, _, _)| *state == from)
        .any(|(_, _, spec)| match spec.target {
            Target::Fixed(target) => target == to,
            Target::Predecessor => from.previous() == Some(to),
        })
}

/// Event kinds with an edge out of `state`, in table order.
pub fn outgoing(state: DealState) -> impl Iterator<Item = EventKind> {
    TRANSITIONS
        .iter()
        .filter(move |(from, _, _)| *from == state)
        .map(|(_, kind, _)| *kind)
}
