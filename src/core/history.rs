//! Append-only audit trail of state transitions.
//!
//! History values are immutable: `record` returns a new history with the
//! transition appended and leaves the original untouched.

use super::event::ActorId;
use super::state::{DealState, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single accepted transition.
///
/// # Example
///
/// ```rust
/// use deal_workflow::core::{ActorId, DealState, TransitionRecord};
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from_state: DealState::Locked,
///     to_state: DealState::PendingLawyer,
///     timestamp: Utc::now(),
///     triggered_by: ActorId::new("admin-7"),
///     notes: None,
/// };
/// assert!(!record.is_ownership_transfer());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<S: State> {
    pub from_state: S,
    pub to_state: S,
    pub timestamp: DateTime<Utc>,
    /// Administrator who caused the transition
    pub triggered_by: ActorId,
    pub notes: Option<String>,
}

impl TransitionRecord<DealState> {
    /// True when this transition completed a deal, which is the trigger for
    /// the ownership-transfer side effects owned by downstream consumers.
    pub fn is_ownership_transfer(&self) -> bool {
        self.to_state == DealState::Completed
    }
}

/// Ordered history of transitions.
///
/// # Example
///
/// ```rust
/// use deal_workflow::core::{ActorId, DealState, StateHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let actor = ActorId::new("admin-1");
/// let history = StateHistory::new()
///     .record(TransitionRecord {
///         from_state: DealState::Locked,
///         to_state: DealState::PendingLawyer,
///         timestamp: Utc::now(),
///         triggered_by: actor.clone(),
///         notes: None,
///     })
///     .record(TransitionRecord {
///         from_state: DealState::PendingLawyer,
///         to_state: DealState::PendingDocs,
///         timestamp: Utc::now(),
///         triggered_by: actor,
///         notes: Some("lawyer engaged".into()),
///     });
///
/// assert_eq!(history.get_path().len(), 3);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<TransitionRecord<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// New history with `transition` appended; `self` is left as it was.
    pub fn record(&self, transition: TransitionRecord<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// States traversed: the first record's `from_state`, then the
    /// `to_state` of every record.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from_state);
        }
        for transition in &self.transitions {
            path.push(&transition.to_state);
        }
        path
    }

    /// Elapsed time between the first and last record.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &[TransitionRecord<S>] {
        &self.transitions
    }

    pub fn last(&self) -> Option<&TransitionRecord<S>> {
        self.transitions.last()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Records triggered by `actor`, oldest first.
    pub fn by_actor<'a>(
        &'a self,
        actor: &'a ActorId,
    ) -> impl Iterator<Item = &'a TransitionRecord<S>> + 'a {
        self.transitions
            .iter()
            .filter(move |record| &record.triggered_by == actor)
    }
}
