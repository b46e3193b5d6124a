//! Guard predicates for controlling state transitions.
//!
//! Guards are pure boolean functions evaluated after the transition table
//! has found an edge and before the move is accepted. They are named values,
//! stored per edge category with optional per-edge overrides, so stricter
//! checks can be substituted without touching the table.

use super::deal::DealContext;
use super::event::{DealEvent, EventKind};
use super::state::DealState;
use super::table::EdgeKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&DealContext, &DealEvent) -> bool + Send + Sync>;

/// Named predicate that decides whether a transition can execute.
///
/// # Example
///
/// ```rust
/// use deal_workflow::core::{DealEvent, Guard};
///
/// // Only allow lawyer confirmation with an explanatory note.
/// let needs_notes = Guard::new("lawyer_notes_present", |_deal, event: &DealEvent| {
///     event.notes().is_some()
/// });
/// assert_eq!(needs_notes.name(), "lawyer_notes_present");
/// ```
#[derive(Clone)]
pub struct Guard {
    name: String,
    predicate: Predicate,
}

impl Guard {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic, free of side effects and
    /// thread-safe.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&DealContext, &DealEvent) -> bool + Send + Sync + 'static,
    {
        Guard {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Guard that accepts every transition.
    pub fn allow(name: impl Into<String>) -> Self {
        Guard::new(name, |_, _| true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, deal: &DealContext, event: &DealEvent) -> bool {
        (self.predicate)(deal, event)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("name", &self.name).finish()
    }
}

pub fn can_transition_forward() -> Guard {
    Guard::allow("can_transition_forward")
}

pub fn can_transition_backward() -> Guard {
    Guard::allow("can_transition_backward")
}

pub fn can_cancel() -> Guard {
    Guard::allow("can_cancel")
}

pub fn can_archive() -> Guard {
    Guard::allow("can_archive")
}

/// Guards for every edge of the transition table.
///
/// Each edge category has a default guard; a specific
/// `(state, event kind)` edge may override it.
#[derive(Clone, Debug)]
pub struct GuardSet {
    forward: Guard,
    backward: Guard,
    cancel: Guard,
    archive: Guard,
    overrides: HashMap<(DealState, EventKind), Guard>,
}

impl Default for GuardSet {
    fn default() -> Self {
        Self {
            forward: can_transition_forward(),
            backward: can_transition_backward(),
            cancel: can_cancel(),
            archive: can_archive(),
            overrides: HashMap::new(),
        }
    }
}

impl GuardSet {
    pub fn set_category(&mut self, edge: EdgeKind, guard: Guard) {
        match edge {
            EdgeKind::Forward => self.forward = guard,
            EdgeKind::Backward => self.backward = guard,
            EdgeKind::Cancel => self.cancel = guard,
            EdgeKind::Archive => self.archive = guard,
        }
    }

    pub fn set_edge(&mut self, from: DealState, kind: EventKind, guard: Guard) {
        self.overrides.insert((from, kind), guard);
    }

    /// The guard that applies to the edge `(from, kind)` of category `edge`.
    pub fn for_edge(&self, from: DealState, kind: EventKind, edge: EdgeKind) -> &Guard {
        if let Some(guard) = self.overrides.get(&(from, kind)) {
            return guard;
        }
        match edge {
            EdgeKind::Forward => &self.forward,
            EdgeKind::Backward => &self.backward,
            EdgeKind::Cancel => &self.cancel,
            EdgeKind::Archive => &self.archive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deal::fixtures::locked_deal;

    fn confirm() -> DealEvent {
        DealEvent::ConfirmLawyer { notes: None }
    }

    #[test]
    fn default_guards_are_permissive() {
        let deal = locked_deal();
        let guards = GuardSet::default();

        for edge in [
            EdgeKind::Forward,
            EdgeKind::Backward,
            EdgeKind::Cancel,
            EdgeKind::Archive,
        ] {
            let guard = guards.for_edge(DealState::Locked, EventKind::ConfirmLawyer, edge);
            assert!(guard.check(&deal, &confirm()));
        }
    }

    #[test]
    fn default_guard_names() {
        let guards = GuardSet::default();
        let name = |edge| {
            guards
                .for_edge(DealState::PendingDocs, EventKind::Cancel, edge)
                .name()
                .to_string()
        };

        assert_eq!(name(EdgeKind::Forward), "can_transition_forward");
        assert_eq!(name(EdgeKind::Backward), "can_transition_backward");
        assert_eq!(name(EdgeKind::Cancel), "can_cancel");
        assert_eq!(name(EdgeKind::Archive), "can_archive");
    }

    #[test]
    fn edge_override_takes_precedence() {
        let mut guards = GuardSet::default();
        guards.set_edge(
            DealState::Locked,
            EventKind::ConfirmLawyer,
            Guard::new("lawyer_credentials_verified", |_, _| false),
        );

        let overridden =
            guards.for_edge(DealState::Locked, EventKind::ConfirmLawyer, EdgeKind::Forward);
        assert_eq!(overridden.name(), "lawyer_credentials_verified");
        assert!(!overridden.check(&locked_deal(), &confirm()));

        let other = guards.for_edge(
            DealState::PendingLawyer,
            EventKind::CompleteDocs,
            EdgeKind::Forward,
        );
        assert_eq!(other.name(), "can_transition_forward");
    }

    #[test]
    fn category_guard_sees_deal_and_event() {
        let mut guards = GuardSet::default();
        guards.set_category(
            EdgeKind::Cancel,
            Guard::new("no_funds_in_flight", |deal: &DealContext, _| {
                !matches!(
                    deal.current_state(),
                    DealState::PendingTransfer | DealState::PendingVerification
                )
            }),
        );

        let guard = guards.for_edge(DealState::Locked, EventKind::Cancel, EdgeKind::Cancel);
        assert!(guard.check(&locked_deal(), &confirm()));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::new("notes_present", |_, event: &DealEvent| event.notes().is_some());
        let deal = locked_deal();
        let event = DealEvent::ConfirmLawyer {
            notes: Some("ok".into()),
        };

        assert_eq!(guard.check(&deal, &event), guard.check(&deal, &event));
        assert!(guard.check(&deal, &event));
    }
}
