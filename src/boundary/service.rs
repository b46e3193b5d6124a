//! Caller-facing façade: authorization, request validation, persistence.

use super::authorization::{AccessToken, AuthorizationError, Authorizer};
use super::store::{DealStore, StoreError};
use crate::config::WorkflowConfig;
use crate::core::{
    DealContext, DealEvent, DealEventWithActor, DealId, DealState, DealTermsError, EventKind,
    NewDeal, TransitionRecord,
};
use crate::enforcement::{RequestRules, RequestViolation};
use crate::engine::{DealWorkflow, TransitionError, TransitionErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fact produced by every accepted transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealTransitioned {
    pub deal: DealContext,
    pub record: TransitionRecord<DealState>,
}

impl DealTransitioned {
    /// True when the deal just reached `completed`; downstream ownership
    /// transfer keys off this.
    pub fn is_ownership_transfer(&self) -> bool {
        self.record.is_ownership_transfer()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("request rejected: {}", join_violations(.0))]
    InvalidRequest(Vec<RequestViolation>),

    #[error(transparent)]
    InvalidTerms(#[from] DealTermsError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("deal {deal_id} kept changing; gave up after {attempts} attempts")]
    ConflictRetriesExhausted { deal_id: DealId, attempts: u32 },
}

fn join_violations(violations: &[RequestViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

const INTERNAL_MESSAGE: &str = "Something went wrong while updating this deal. Please try again later.";

impl ServiceError {
    /// Message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transition(err) => match err.kind() {
                TransitionErrorKind::IllegalTransition => {
                    "This deal is no longer in a state that allows this action.".to_string()
                }
                TransitionErrorKind::InvalidBackwardTarget => {
                    "A deal can only be moved back to the step directly before its current one."
                        .to_string()
                }
                TransitionErrorKind::GuardRejected => {
                    "This action is not allowed for this deal right now.".to_string()
                }
                TransitionErrorKind::MissingActor => INTERNAL_MESSAGE.to_string(),
            },
            Self::Authorization(AuthorizationError::Unauthenticated) => {
                "Please sign in again to continue.".to_string()
            }
            Self::Authorization(AuthorizationError::Forbidden { .. }) => {
                "You do not have permission to perform this action.".to_string()
            }
            Self::InvalidRequest(violations) => {
                format!("Please correct the request: {}.", join_violations(violations))
            }
            Self::InvalidTerms(err) => format!("The deal terms are invalid: {err}."),
            Self::Store(StoreError::NotFound(_)) => "This deal could not be found.".to_string(),
            Self::Store(StoreError::AlreadyExists(_)) => {
                "A deal with this identifier already exists.".to_string()
            }
            Self::Store(StoreError::VersionConflict { .. })
            | Self::ConflictRetriesExhausted { .. } => {
                "This deal was changed by someone else. Please refresh and try again.".to_string()
            }
            Self::Store(
                StoreError::Snapshot(_) | StoreError::NotASuccessor(_) | StoreError::Unavailable(_),
            ) => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Integration or infrastructure failures, as opposed to business
    /// rejections the caller can act on.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Transition(TransitionError::MissingActor { .. })
                | Self::Store(
                    StoreError::Snapshot(_)
                        | StoreError::NotASuccessor(_)
                        | StoreError::Unavailable(_)
                )
        )
    }
}

/// Runs transitions against stored deals.
///
/// Each call authorizes the caller, validates the request shape, loads the
/// deal, runs the pure engine and writes the result back with an optimistic
/// version check. On a version conflict the deal is reloaded and the request
/// re-evaluated against the newer state.
#[derive(Clone)]
pub struct DealService {
    store: Arc<dyn DealStore>,
    authorizer: Arc<dyn Authorizer>,
    workflow: DealWorkflow,
    rules: Arc<RequestRules>,
    config: WorkflowConfig,
}

impl DealService {
    pub fn new(store: Arc<dyn DealStore>, authorizer: Arc<dyn Authorizer>) -> Self {
        let config = WorkflowConfig::default();
        Self {
            store,
            authorizer,
            workflow: DealWorkflow::new(),
            rules: Arc::new(RequestRules::from_config(&config)),
            config,
        }
    }

    pub fn with_workflow(mut self, workflow: DealWorkflow) -> Self {
        self.workflow = workflow;
        self
    }

    /// Replace the configuration; request rules are rebuilt from it.
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.rules = Arc::new(RequestRules::from_config(&config));
        self.config = config;
        self
    }

    pub fn with_rules(mut self, rules: RequestRules) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Create and store a new deal in `locked`.
    pub fn create_deal(
        &self,
        token: &AccessToken,
        input: NewDeal,
    ) -> Result<DealContext, ServiceError> {
        let actor = self.authorizer.authenticate(token).map_err(|err| {
            warn!(error = %err, "Deal creation rejected");
            err
        })?;

        let deal = DealContext::new(input).map_err(|err| {
            warn!(error = %err, actor = %actor, "Deal terms rejected");
            err
        })?;

        self.store.insert(&deal).map_err(|err| {
            log_store_failure(deal.deal_id(), &err);
            err
        })?;

        info!(
            deal_id = %deal.deal_id(),
            actor = %actor,
            lock_request_id = deal.lock_request_id(),
            "Deal created"
        );
        Ok(deal)
    }

    pub fn get_deal(&self, deal_id: &DealId) -> Result<DealContext, ServiceError> {
        Ok(self.store.load(deal_id)?)
    }

    pub fn history(
        &self,
        deal_id: &DealId,
    ) -> Result<Vec<TransitionRecord<DealState>>, ServiceError> {
        let deal = self.get_deal(deal_id)?;
        Ok(deal.state_history().transitions().to_vec())
    }

    /// Event kinds the stored deal currently accepts.
    pub fn permitted_events(&self, deal_id: &DealId) -> Result<Vec<EventKind>, ServiceError> {
        let deal = self.get_deal(deal_id)?;
        Ok(self.workflow.permitted_events(&deal))
    }

    pub fn transition(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        event: DealEvent,
    ) -> Result<DealTransitioned, ServiceError> {
        let kind = event.kind();

        let actor = self.authorizer.authorize(token, kind).map_err(|err| {
            warn!(deal_id = %deal_id, event = %kind, error = %err, "Transition not authorized");
            err
        })?;

        if let Err(violations) = self.rules.check(&event) {
            warn!(
                deal_id = %deal_id,
                event = %kind,
                violations = violations.len(),
                "Transition request failed validation"
            );
            return Err(ServiceError::InvalidRequest(violations));
        }

        let attempts = self.config.max_conflict_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let deal = self.store.load(deal_id).map_err(|err| {
                log_store_failure(deal_id, &err);
                err
            })?;
            let expected_version = deal.version();

            let outcome = self
                .workflow
                .apply(&deal, DealEventWithActor::new(event.clone(), actor.clone()))
                .map_err(|err| {
                    log_rejection(deal_id, &err);
                    err
                })?;

            match self.store.compare_and_swap(expected_version, &outcome.context) {
                Ok(()) => {
                    info!(
                        deal_id = %deal_id,
                        event = %kind,
                        from = %outcome.record.from_state,
                        to = %outcome.record.to_state,
                        actor = %actor,
                        version = outcome.context.version(),
                        "Deal transitioned"
                    );
                    return Ok(DealTransitioned {
                        deal: outcome.context,
                        record: outcome.record,
                    });
                }
                Err(StoreError::VersionConflict { actual, .. }) => {
                    debug!(
                        deal_id = %deal_id,
                        event = %kind,
                        attempt,
                        expected_version,
                        actual_version = actual,
                        "Concurrent update detected, re-evaluating"
                    );
                }
                Err(err) => {
                    log_store_failure(deal_id, &err);
                    return Err(err.into());
                }
            }
        }

        warn!(deal_id = %deal_id, event = %kind, attempts, "Gave up after repeated version conflicts");
        Err(ServiceError::ConflictRetriesExhausted {
            deal_id: deal_id.clone(),
            attempts,
        })
    }

    pub fn confirm_lawyer(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        self.transition(deal_id, token, DealEvent::ConfirmLawyer { notes })
    }

    pub fn complete_docs(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        self.transition(deal_id, token, DealEvent::CompleteDocs { notes })
    }

    pub fn receive_funds(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        self.transition(deal_id, token, DealEvent::ReceiveFunds { notes })
    }

    pub fn verify_funds(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        self.transition(deal_id, token, DealEvent::VerifyFunds { notes })
    }

    pub fn complete_deal(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        self.transition(deal_id, token, DealEvent::CompleteDeal { notes })
    }

    pub fn go_back(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        to_state: DealState,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        self.transition(deal_id, token, DealEvent::GoBack { to_state, notes })
    }

    pub fn cancel(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        reason: impl Into<String>,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        let reason = reason.into();
        self.transition(deal_id, token, DealEvent::Cancel { reason, notes })
    }

    pub fn archive(
        &self,
        deal_id: &DealId,
        token: &AccessToken,
        notes: Option<String>,
    ) -> Result<DealTransitioned, ServiceError> {
        self.transition(deal_id, token, DealEvent::Archive { notes })
    }
}

fn log_rejection(deal_id: &DealId, err: &TransitionError) {
    if err.is_fatal() {
        error!(
            deal_id = %deal_id,
            state = %err.state(),
            event = %err.event(),
            kind = %err.kind(),
            "Transition reached the engine without an actor"
        );
    } else {
        warn!(
            deal_id = %deal_id,
            state = %err.state(),
            event = %err.event(),
            kind = %err.kind(),
            "Transition rejected"
        );
    }
}

fn log_store_failure(deal_id: &DealId, err: &StoreError) {
    match err {
        StoreError::NotFound(_) | StoreError::AlreadyExists(_) => {
            warn!(deal_id = %deal_id, error = %err, "Deal store rejected request")
        }
        _ => error!(deal_id = %deal_id, error = %err, "Deal store failure"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::authorization::StaticAuthorizer;
    use crate::boundary::store::InMemoryDealStore;
    use crate::core::deal::fixtures::new_deal;
    use crate::core::{ActorId, EdgeKind, Guard};

    fn token() -> AccessToken {
        AccessToken::new("token-admin")
    }

    fn service() -> DealService {
        let authorizer = StaticAuthorizer::new().grant(token(), ActorId::new("admin-1"));
        DealService::new(Arc::new(InMemoryDealStore::new()), Arc::new(authorizer))
    }

    #[test]
    fn create_then_transition_persists() {
        let service = service();
        let deal = service.create_deal(&token(), new_deal()).unwrap();

        let event = service
            .confirm_lawyer(deal.deal_id(), &token(), Some("engaged".into()))
            .unwrap();

        assert_eq!(event.record.to_state, DealState::PendingLawyer);
        assert!(!event.is_ownership_transfer());
        let stored = service.get_deal(deal.deal_id()).unwrap();
        assert_eq!(stored, event.deal);
        assert_eq!(service.history(deal.deal_id()).unwrap().len(), 1);
    }

    #[test]
    fn illegal_transition_has_friendly_message() {
        let service = service();
        let deal = service.create_deal(&token(), new_deal()).unwrap();

        let err = service
            .archive(deal.deal_id(), &token(), None)
            .unwrap_err();

        assert!(!err.is_internal());
        assert_eq!(
            err.user_message(),
            "This deal is no longer in a state that allows this action."
        );
    }

    #[test]
    fn blank_actor_is_internal_error() {
        let blank = AccessToken::new("token-blank");
        let authorizer = StaticAuthorizer::new()
            .grant(token(), ActorId::new("admin-1"))
            .grant(blank.clone(), ActorId::new("  "));
        let service = DealService::new(Arc::new(InMemoryDealStore::new()), Arc::new(authorizer));
        let deal = service.create_deal(&token(), new_deal()).unwrap();

        let err = service
            .confirm_lawyer(deal.deal_id(), &blank, None)
            .unwrap_err();

        assert!(err.is_internal());
        assert!(matches!(
            err,
            ServiceError::Transition(TransitionError::MissingActor { .. })
        ));
        assert_eq!(
            service.get_deal(deal.deal_id()).unwrap().current_state(),
            DealState::Locked
        );
    }

    #[test]
    fn cancel_without_reason_is_invalid_request() {
        let service = service();
        let deal = service.create_deal(&token(), new_deal()).unwrap();

        let err = service.cancel(deal.deal_id(), &token(), "", None).unwrap_err();

        assert!(matches!(
            err,
            ServiceError::InvalidRequest(ref v) if v == &vec![RequestViolation::MissingCancelReason]
        ));
    }

    #[test]
    fn config_relaxes_cancel_reason() {
        let config = WorkflowConfig {
            require_cancel_reason: false,
            ..WorkflowConfig::default()
        };
        let service = service().with_config(config);
        let deal = service.create_deal(&token(), new_deal()).unwrap();

        let event = service.cancel(deal.deal_id(), &token(), "", None).unwrap();
        assert_eq!(event.record.to_state, DealState::Cancelled);
    }

    #[test]
    fn custom_workflow_guards_apply() {
        let workflow = DealWorkflow::builder()
            .guard(EdgeKind::Cancel, Guard::new("cancellation_frozen", |_, _| false))
            .build();
        let service = service().with_workflow(workflow);
        let deal = service.create_deal(&token(), new_deal()).unwrap();

        let err = service
            .cancel(deal.deal_id(), &token(), "investor withdrew", None)
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Transition(TransitionError::GuardRejected { .. })
        ));
        assert_eq!(
            service.permitted_events(deal.deal_id()).unwrap(),
            vec![EventKind::ConfirmLawyer]
        );
    }

    #[test]
    fn unknown_deal_is_not_found() {
        let service = service();
        let err = service
            .confirm_lawyer(&DealId::new("missing"), &token(), None)
            .unwrap_err();

        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
        assert_eq!(err.user_message(), "This deal could not be found.");
    }

    #[test]
    fn invalid_terms_are_rejected_before_storage() {
        let service = service();
        let mut input = new_deal();
        input.purchase_percentage = 120.0;

        let err = service.create_deal(&token(), input).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTerms(_)));
        assert!(service.store.list_ids().unwrap().is_empty());
    }
}
