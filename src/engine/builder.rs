//! Builder for configuring a [`DealWorkflow`].

use super::DealWorkflow;
use crate::core::{DealState, EdgeKind, EventKind, Guard, GuardSet};

/// Fluent construction of a workflow with substituted guards.
///
/// The table shape is fixed; only guards can be replaced.
///
/// # Example
///
/// ```rust
/// use deal_workflow::core::{DealState, EdgeKind, EventKind, Guard};
/// use deal_workflow::engine::DealWorkflow;
///
/// let workflow = DealWorkflow::builder()
///     .edge_guard(
///         DealState::PendingLawyer,
///         EventKind::CompleteDocs,
///         Guard::new("signed_documents_uploaded", |_, event| event.notes().is_some()),
///     )
///     .guard(EdgeKind::Cancel, Guard::new("can_cancel", |_, _| true))
///     .build();
/// # let _ = workflow;
/// ```
#[derive(Debug, Default)]
pub struct DealWorkflowBuilder {
    guards: GuardSet,
}

impl DealWorkflowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default guard for a whole edge category.
    pub fn guard(mut self, edge: EdgeKind, guard: Guard) -> Self {
        self.guards.set_category(edge, guard);
        self
    }

    /// Guard a single edge, taking precedence over its category guard.
    pub fn edge_guard(mut self, from: DealState, kind: EventKind, guard: Guard) -> Self {
        self.guards.set_edge(from, kind, guard);
        self
    }

    pub fn build(self) -> DealWorkflow {
        DealWorkflow {
            guards: self.guards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deal::fixtures::locked_deal;
    use crate::core::{ActorId, DealEvent, DealEventWithActor};
    use crate::engine::TransitionError;

    #[test]
    fn builder_without_guards_matches_default() {
        let built = DealWorkflowBuilder::new().build();
        let deal = locked_deal();
        let event = DealEventWithActor::new(
            DealEvent::ConfirmLawyer { notes: None },
            ActorId::new("admin-1"),
        );

        assert!(built.transition(&deal, event).is_ok());
    }

    #[test]
    fn edge_guard_blocks_only_its_edge() {
        let workflow = DealWorkflowBuilder::new()
            .edge_guard(
                DealState::Locked,
                EventKind::ConfirmLawyer,
                Guard::new("lawyer_credentials_verified", |_, _| false),
            )
            .build();
        let deal = locked_deal();
        let actor = ActorId::new("admin-1");

        let blocked = workflow.transition(
            &deal,
            DealEventWithActor::new(DealEvent::ConfirmLawyer { notes: None }, actor.clone()),
        );
        assert_eq!(
            blocked,
            Err(TransitionError::GuardRejected {
                state: DealState::Locked,
                event: EventKind::ConfirmLawyer,
                guard: "lawyer_credentials_verified".to_string(),
            })
        );

        let cancel = workflow.transition(
            &deal,
            DealEventWithActor::new(
                DealEvent::Cancel {
                    reason: "withdrawn".into(),
                    notes: None,
                },
                actor,
            ),
        );
        assert!(cancel.is_ok());
    }
}
