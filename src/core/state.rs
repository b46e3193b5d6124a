//! Deal lifecycle states.
//!
//! The `State` trait is the minimal surface the history types need from a
//! state value. `DealState` is the closed set of states a deal moves through,
//! together with the pure lookup helpers derived from the forward path.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;

/// Trait for workflow states.
///
/// All methods are pure. States are immutable values describing the current
/// position of an aggregate in its workflow.
///
/// # Example
///
/// ```rust
/// use deal_workflow::core::{DealState, State};
///
/// assert_eq!(DealState::PendingDocs.name(), "pending_docs");
/// assert!(DealState::Archived.is_final());
/// assert!(!DealState::Locked.is_final());
/// ```
pub trait State:
    Copy + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Stable identifier used in audit records and logs.
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Lifecycle state of a deal.
///
/// The forward path is strictly linear:
/// `Locked → PendingLawyer → PendingDocs → PendingTransfer →
/// PendingVerification → Completed`. `Completed` and `Cancelled` can only be
/// archived, and `Archived` accepts nothing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealState {
    Locked,
    PendingLawyer,
    PendingDocs,
    PendingTransfer,
    PendingVerification,
    Completed,
    Cancelled,
    Archived,
}

impl DealState {
    /// Every state, in forward-path order followed by the terminal states.
    pub const ALL: [DealState; 8] = [
        DealState::Locked,
        DealState::PendingLawyer,
        DealState::PendingDocs,
        DealState::PendingTransfer,
        DealState::PendingVerification,
        DealState::Completed,
        DealState::Cancelled,
        DealState::Archived,
    ];

    /// State every deal is created in.
    pub const INITIAL: DealState = DealState::Locked;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::PendingLawyer => "pending_lawyer",
            Self::PendingDocs => "pending_docs",
            Self::PendingTransfer => "pending_transfer",
            Self::PendingVerification => "pending_verification",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        }
    }

    /// True for `completed`, `cancelled` and `archived`.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Completed | Self::Cancelled | Self::Archived => true,
            Self::Locked
            | Self::PendingLawyer
            | Self::PendingDocs
            | Self::PendingTransfer
            | Self::PendingVerification => false,
        }
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Canonical successor.
    ///
    /// `Completed` and `Cancelled` advance to `Archived`; `Archived` has no
    /// successor.
    pub fn next(&self) -> Option<DealState> {
        match self {
            Self::Locked => Some(Self::PendingLawyer),
            Self::PendingLawyer => Some(Self::PendingDocs),
            Self::PendingDocs => Some(Self::PendingTransfer),
            Self::PendingTransfer => Some(Self::PendingVerification),
            Self::PendingVerification => Some(Self::Completed),
            Self::Completed | Self::Cancelled => Some(Self::Archived),
            Self::Archived => None,
        }
    }

    /// Canonical predecessor on the forward path.
    ///
    /// `None` for `Locked` and for every terminal state.
    pub fn previous(&self) -> Option<DealState> {
        match self {
            Self::Locked => None,
            Self::PendingLawyer => Some(Self::Locked),
            Self::PendingDocs => Some(Self::PendingLawyer),
            Self::PendingTransfer => Some(Self::PendingDocs),
            Self::PendingVerification => Some(Self::PendingTransfer),
            Self::Completed | Self::Cancelled | Self::Archived => None,
        }
    }
}

impl State for DealState {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl fmt::Display for DealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a deal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown deal state '{0}'")]
pub struct UnknownState(pub String);

impl FromStr for DealState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// True for `completed`, `cancelled` and `archived`.
pub fn is_terminal_state(state: DealState) -> bool {
    state.is_terminal()
}

/// True iff `state` is not terminal.
pub fn can_cancel_from_state(state: DealState) -> bool {
    state.can_cancel()
}

/// Canonical forward successor of `state`, if any.
pub fn next_state(state: DealState) -> Option<DealState> {
    state.next()
}

/// Canonical backward predecessor of `state`, if any.
pub fn previous_state(state: DealState) -> Option<DealState> {
    state.previous()
}
