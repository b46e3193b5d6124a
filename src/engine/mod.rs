//! The transition engine.
//!
//! `DealWorkflow` is a pure function from `(context, event, actor)` to a new
//! context. It reads its inputs, never mutates them, performs no I/O and
//! does not log, so it can be shared freely between threads. Persisting the
//! result atomically is the caller's job (see [`crate::boundary`]).
//!
//! # Example
//!
//! ```rust
//! use deal_workflow::core::{ActorId, DealContext, DealEvent, DealEventWithActor, DealId, DealState, NewDeal};
//! use deal_workflow::engine::DealWorkflow;
//!
//! let deal = DealContext::new(NewDeal {
//!     deal_id: DealId::new("deal-42"),
//!     lock_request_id: "lock-9".into(),
//!     listing_id: "listing-3".into(),
//!     mortgage_id: "mortgage-5".into(),
//!     investor_id: "investor-8".into(),
//!     purchase_percentage: 40.0,
//!     deal_value: 80_000.0,
//! })
//! .unwrap();
//!
//! let workflow = DealWorkflow::new();
//! let event = DealEventWithActor::new(
//!     DealEvent::ConfirmLawyer { notes: None },
//!     ActorId::new("admin-1"),
//! );
//! let next = workflow.transition(&deal, event).unwrap();
//!
//! assert_eq!(next.current_state(), DealState::PendingLawyer);
//! assert_eq!(next.state_history().len(), 1);
//! assert_eq!(deal.current_state(), DealState::Locked);
//! ```

mod builder;
mod error;

pub use builder::DealWorkflowBuilder;
pub use error::{TransitionError, TransitionErrorKind};

use crate::core::table::{self, Target};
use crate::core::{
    DealContext, DealEvent, DealEventWithActor, DealState, EventKind, GuardSet, TransitionRecord,
};
use chrono::{DateTime, Utc};

/// Result of an accepted transition: the new context and the record that
/// was appended to its history.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionOutcome {
    pub context: DealContext,
    pub record: TransitionRecord<DealState>,
}

/// Stateless transition engine holding only the guard configuration.
#[derive(Clone, Debug, Default)]
pub struct DealWorkflow {
    guards: GuardSet,
}

impl DealWorkflow {
    /// Workflow with the default permissive guards.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DealWorkflowBuilder {
        DealWorkflowBuilder::new()
    }

    /// Apply `event` to `context`, returning the updated deal.
    pub fn transition(
        &self,
        context: &DealContext,
        event: DealEventWithActor,
    ) -> Result<DealContext, TransitionError> {
        self.apply(context, event).map(|outcome| outcome.context)
    }

    /// Apply `event` to `context`, returning the new context together with
    /// the appended record so the caller can persist both.
    pub fn apply(
        &self,
        context: &DealContext,
        event: DealEventWithActor,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.apply_at(context, event, Utc::now())
    }

    /// Same as [`apply`](Self::apply) with an explicit clock reading.
    ///
    /// The record's timestamp is clamped to the previous record's so the
    /// history never goes backwards in time.
    pub fn apply_at(
        &self,
        context: &DealContext,
        event: DealEventWithActor,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let from = context.current_state();
        let kind = event.event.kind();

        let actor = event
            .actor()
            .cloned()
            .ok_or(TransitionError::MissingActor { state: from, event: kind })?;

        let to = self.resolve(context, &event.event)?;

        let timestamp = match context.state_history().last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let record = TransitionRecord {
            from_state: from,
            to_state: to,
            timestamp,
            triggered_by: actor,
            notes: event.event.audit_notes(),
        };

        Ok(TransitionOutcome {
            context: context.with_transition(record.clone()),
            record,
        })
    }

    /// Target state for `event`, or the reason it is rejected.
    ///
    /// Runs the table lookup, then the edge's guard, then the predecessor
    /// check for `GO_BACK`. Builds no record.
    pub fn resolve(
        &self,
        context: &DealContext,
        event: &DealEvent,
    ) -> Result<DealState, TransitionError> {
        let from = context.current_state();
        let kind = event.kind();

        let spec = table::lookup(from, kind)
            .ok_or(TransitionError::IllegalTransition { state: from, event: kind })?;

        let guard = self.guards.for_edge(from, kind, spec.edge);
        if !guard.check(context, event) {
            return Err(TransitionError::GuardRejected {
                state: from,
                event: kind,
                guard: guard.name().to_string(),
            });
        }

        let to = match (spec.target, event) {
            (Target::Fixed(to), _) => to,
            (Target::Predecessor, DealEvent::GoBack { to_state, .. }) => {
                let expected = from.previous();
                if expected != Some(*to_state) {
                    return Err(TransitionError::InvalidBackwardTarget {
                        state: from,
                        target: *to_state,
                        expected,
                    });
                }
                *to_state
            }
            // Only GO_BACK rows carry a predecessor target.
            (Target::Predecessor, _) => {
                return Err(TransitionError::IllegalTransition { state: from, event: kind })
            }
        };
        Ok(to)
    }

    /// Whether an event of `kind` would currently be accepted.
    ///
    /// Guards are evaluated against a payload-free event: no notes, an empty
    /// cancellation reason, and for `GO_BACK` the canonical predecessor as
    /// target. A guard that inspects the payload, e.g. one requiring a
    /// cancellation reason, therefore reports `false` here even though a
    /// request carrying that payload would be accepted.
    pub fn can(&self, context: &DealContext, kind: EventKind) -> bool {
        let target = context.current_state().previous();
        match DealEvent::bare(kind, target) {
            Some(probe) => self.resolve(context, &probe).is_ok(),
            None => false,
        }
    }

    /// Event kinds the deal currently accepts, in table order.
    pub fn permitted_events(&self, context: &DealContext) -> Vec<EventKind> {
        table::outgoing(context.current_state())
            .filter(|kind| self.can(context, *kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deal::fixtures::locked_deal;
    use crate::core::{ActorId, EdgeKind, Guard};

    fn admin() -> ActorId {
        ActorId::new("admin-1")
    }

    fn step(workflow: &DealWorkflow, deal: &DealContext, event: DealEvent) -> DealContext {
        workflow
            .transition(deal, DealEventWithActor::new(event, admin()))
            .unwrap()
    }

    fn deal_in(state: DealState) -> DealContext {
        let workflow = DealWorkflow::new();
        let forward = [
            DealEvent::ConfirmLawyer { notes: None },
            DealEvent::CompleteDocs { notes: None },
            DealEvent::ReceiveFunds { notes: None },
            DealEvent::VerifyFunds { notes: None },
            DealEvent::CompleteDeal { notes: None },
        ];
        let mut deal = locked_deal();
        for event in forward {
            if deal.current_state() == state {
                break;
            }
            deal = step(&workflow, &deal, event);
        }
        deal
    }

    #[test]
    fn confirm_lawyer_from_locked() {
        let workflow = DealWorkflow::new();
        let outcome = workflow
            .apply(
                &locked_deal(),
                DealEventWithActor::new(
                    DealEvent::ConfirmLawyer {
                        notes: Some("lawyer engaged".into()),
                    },
                    admin(),
                ),
            )
            .unwrap();

        assert_eq!(outcome.context.current_state(), DealState::PendingLawyer);
        assert_eq!(outcome.record.from_state, DealState::Locked);
        assert_eq!(outcome.record.to_state, DealState::PendingLawyer);
        assert_eq!(outcome.record.triggered_by, admin());
        assert_eq!(outcome.record.notes.as_deref(), Some("lawyer engaged"));
        assert_eq!(outcome.context.state_history().last(), Some(&outcome.record));
    }

    #[test]
    fn forward_path_reaches_completed() {
        let deal = deal_in(DealState::Completed);

        assert_eq!(deal.current_state(), DealState::Completed);
        assert_eq!(deal.state_history().len(), 5);
        assert!(deal.state_history().last().unwrap().is_ownership_transfer());
        assert!(deal.verify_integrity().is_ok());
    }

    #[test]
    fn skipping_a_step_is_illegal() {
        let workflow = DealWorkflow::new();
        let result = workflow.transition(
            &locked_deal(),
            DealEventWithActor::new(DealEvent::ReceiveFunds { notes: None }, admin()),
        );

        assert_eq!(
            result,
            Err(TransitionError::IllegalTransition {
                state: DealState::Locked,
                event: EventKind::ReceiveFunds,
            })
        );
    }

    #[test]
    fn missing_actor_is_checked_first() {
        let workflow = DealWorkflow::new();
        let archived = step(
            &workflow,
            &step(
                &workflow,
                &locked_deal(),
                DealEvent::Cancel {
                    reason: "dup".into(),
                    notes: None,
                },
            ),
            DealEvent::Archive { notes: None },
        );

        // Even an illegal event reports the missing actor.
        let result = workflow.transition(
            &archived,
            DealEventWithActor::anonymous(DealEvent::ConfirmLawyer { notes: None }),
        );
        assert_eq!(
            result.unwrap_err().kind(),
            TransitionErrorKind::MissingActor
        );
    }

    #[test]
    fn go_back_only_to_predecessor() {
        let workflow = DealWorkflow::new();
        let deal = deal_in(DealState::PendingTransfer);

        let two_steps = workflow.transition(
            &deal,
            DealEventWithActor::new(
                DealEvent::GoBack {
                    to_state: DealState::PendingLawyer,
                    notes: None,
                },
                admin(),
            ),
        );
        assert_eq!(
            two_steps,
            Err(TransitionError::InvalidBackwardTarget {
                state: DealState::PendingTransfer,
                target: DealState::PendingLawyer,
                expected: Some(DealState::PendingDocs),
            })
        );

        let one_step = step(
            &workflow,
            &deal,
            DealEvent::GoBack {
                to_state: DealState::PendingDocs,
                notes: None,
            },
        );
        assert_eq!(one_step.current_state(), DealState::PendingDocs);
    }

    #[test]
    fn go_back_on_terminal_state_is_illegal() {
        let workflow = DealWorkflow::new();
        let result = workflow.transition(
            &deal_in(DealState::Completed),
            DealEventWithActor::new(
                DealEvent::GoBack {
                    to_state: DealState::PendingVerification,
                    notes: None,
                },
                admin(),
            ),
        );

        assert_eq!(
            result.unwrap_err().kind(),
            TransitionErrorKind::IllegalTransition
        );
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let workflow = DealWorkflow::new();
        let now = Utc::now();
        let first = workflow
            .apply_at(
                &locked_deal(),
                DealEventWithActor::new(DealEvent::ConfirmLawyer { notes: None }, admin()),
                now,
            )
            .unwrap();
        let second = workflow
            .apply_at(
                &first.context,
                DealEventWithActor::new(DealEvent::CompleteDocs { notes: None }, admin()),
                now - chrono::Duration::seconds(30),
            )
            .unwrap();

        assert_eq!(second.record.timestamp, now);
        assert!(second.context.verify_integrity().is_ok());
    }

    #[test]
    fn permitted_events_per_state() {
        let workflow = DealWorkflow::new();

        assert_eq!(
            workflow.permitted_events(&locked_deal()),
            vec![EventKind::ConfirmLawyer, EventKind::Cancel]
        );
        assert_eq!(
            workflow.permitted_events(&deal_in(DealState::PendingDocs)),
            vec![EventKind::ReceiveFunds, EventKind::GoBack, EventKind::Cancel]
        );
        assert_eq!(
            workflow.permitted_events(&deal_in(DealState::Completed)),
            vec![EventKind::Archive]
        );
    }

    #[test]
    fn permitted_events_respect_guards() {
        let workflow = DealWorkflow::builder()
            .guard(EdgeKind::Cancel, Guard::new("never", |_, _| false))
            .build();

        assert_eq!(
            workflow.permitted_events(&locked_deal()),
            vec![EventKind::ConfirmLawyer]
        );
    }

    #[test]
    fn payload_guards_see_empty_probe() {
        let workflow = DealWorkflow::builder()
            .guard(
                EdgeKind::Cancel,
                Guard::new("reason_given", |_, event| match event {
                    DealEvent::Cancel { reason, .. } => !reason.trim().is_empty(),
                    _ => true,
                }),
            )
            .build();
        let deal = locked_deal();

        assert!(!workflow.can(&deal, EventKind::Cancel));
        assert_eq!(
            workflow.permitted_events(&deal),
            vec![EventKind::ConfirmLawyer]
        );

        let cancelled = step(
            &workflow,
            &deal,
            DealEvent::Cancel {
                reason: "lock expired".into(),
                notes: None,
            },
        );
        assert_eq!(cancelled.current_state(), DealState::Cancelled);
    }

    #[test]
    fn rejection_leaves_input_untouched() {
        let workflow = DealWorkflow::new();
        let deal = deal_in(DealState::PendingDocs);
        let before = deal.clone();

        let _ = workflow.transition(
            &deal,
            DealEventWithActor::new(DealEvent::Archive { notes: None }, admin()),
        );

        assert_eq!(deal, before);
    }
}
