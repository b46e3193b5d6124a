//! The deal aggregate.
//!
//! A `DealContext` is created once, always in `locked` with an empty
//! history, and from then on is only replaced by the values the transition
//! engine returns. Fields are private so that nothing outside the crate can
//! move `current_state` without appending to the history.

use super::history::{StateHistory, TransitionRecord};
use super::state::DealState;
use super::table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a deal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(String);

impl DealId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier for callers that do not bring their own.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input for creating a deal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewDeal {
    pub deal_id: DealId,
    pub lock_request_id: String,
    pub listing_id: String,
    pub mortgage_id: String,
    pub investor_id: String,
    /// Share of the mortgage being purchased, in percent
    pub purchase_percentage: f64,
    pub deal_value: f64,
}

/// Rejected deal creation input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DealTermsError {
    #[error("identifier '{field}' must not be blank")]
    BlankIdentifier { field: &'static str },

    #[error("purchase percentage must be within (0, 100], got {0}")]
    InvalidPurchasePercentage(f64),

    #[error("deal value must be a positive amount, got {0}")]
    InvalidDealValue(f64),
}

/// A stored history that breaks one of the aggregate's invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    #[error("first transition starts at '{found}', expected 'locked'")]
    WrongInitialState { found: DealState },

    #[error("transition {index} starts at '{found}' but the previous one ended at '{expected}'")]
    BrokenChain {
        index: usize,
        expected: DealState,
        found: DealState,
    },

    #[error("transition {index} moves '{from}' to '{to}', which no event allows")]
    IllegalEdge {
        index: usize,
        from: DealState,
        to: DealState,
    },

    #[error("stored deal terms are invalid: {0}")]
    InvalidTerms(#[from] DealTermsError),

    #[error("transition {index} is timestamped before its predecessor")]
    TimestampRegression { index: usize },

    #[error("current state '{current}' does not match history tail '{expected}'")]
    StateMismatch {
        current: DealState,
        expected: DealState,
    },
}

/// Full deal record: immutable terms plus workflow position and audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealContext {
    deal_id: DealId,
    lock_request_id: String,
    listing_id: String,
    mortgage_id: String,
    investor_id: String,
    purchase_percentage: f64,
    deal_value: f64,
    created_at: DateTime<Utc>,
    current_state: DealState,
    state_history: StateHistory<DealState>,
}

impl DealContext {
    /// Create a deal in `locked` with an empty history.
    pub fn new(input: NewDeal) -> Result<Self, DealTermsError> {
        Self::new_at(input, Utc::now())
    }

    pub fn new_at(input: NewDeal, created_at: DateTime<Utc>) -> Result<Self, DealTermsError> {
        check_terms(
            &input.deal_id,
            [
                ("lock_request_id", input.lock_request_id.as_str()),
                ("listing_id", input.listing_id.as_str()),
                ("mortgage_id", input.mortgage_id.as_str()),
                ("investor_id", input.investor_id.as_str()),
            ],
            input.purchase_percentage,
            input.deal_value,
        )?;

        Ok(Self {
            deal_id: input.deal_id,
            lock_request_id: input.lock_request_id,
            listing_id: input.listing_id,
            mortgage_id: input.mortgage_id,
            investor_id: input.investor_id,
            purchase_percentage: input.purchase_percentage,
            deal_value: input.deal_value,
            created_at,
            current_state: DealState::INITIAL,
            state_history: StateHistory::new(),
        })
    }

    pub fn deal_id(&self) -> &DealId {
        &self.deal_id
    }

    pub fn lock_request_id(&self) -> &str {
        &self.lock_request_id
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    pub fn mortgage_id(&self) -> &str {
        &self.mortgage_id
    }

    pub fn investor_id(&self) -> &str {
        &self.investor_id
    }

    pub fn purchase_percentage(&self) -> f64 {
        self.purchase_percentage
    }

    pub fn deal_value(&self) -> f64 {
        self.deal_value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn current_state(&self) -> DealState {
        self.current_state
    }

    pub fn state_history(&self) -> &StateHistory<DealState> {
        &self.state_history
    }

    /// Optimistic-concurrency version.
    ///
    /// Every accepted transition appends exactly one record, so the history
    /// length increases by one per accepted write.
    pub fn version(&self) -> u64 {
        self.state_history.len() as u64
    }

    pub fn is_terminal(&self) -> bool {
        self.current_state.is_terminal()
    }

    /// New context with `record` appended and the state moved to its target.
    ///
    /// Only the engine calls this, after it has validated the move.
    pub(crate) fn with_transition(&self, record: TransitionRecord<DealState>) -> Self {
        let mut next = self.clone();
        next.current_state = record.to_state;
        next.state_history = self.state_history.record(record);
        next
    }

    /// Whether `self` is `previous` advanced by exactly one transition:
    /// same identity and terms, and `previous`'s history as a prefix.
    pub fn is_successor_of(&self, previous: &DealContext) -> bool {
        let prior = previous.state_history.transitions();
        self.version() == previous.version() + 1
            && self.deal_id == previous.deal_id
            && self.lock_request_id == previous.lock_request_id
            && self.listing_id == previous.listing_id
            && self.mortgage_id == previous.mortgage_id
            && self.investor_id == previous.investor_id
            && self.purchase_percentage == previous.purchase_percentage
            && self.deal_value == previous.deal_value
            && self.created_at == previous.created_at
            && self.state_history.transitions().starts_with(prior)
    }

    /// Verify the terms and history invariants of a context that came from
    /// outside the engine, e.g. a stored snapshot.
    pub fn verify_integrity(&self) -> Result<(), IntegrityError> {
        check_terms(
            &self.deal_id,
            [
                ("lock_request_id", self.lock_request_id.as_str()),
                ("listing_id", self.listing_id.as_str()),
                ("mortgage_id", self.mortgage_id.as_str()),
                ("investor_id", self.investor_id.as_str()),
            ],
            self.purchase_percentage,
            self.deal_value,
        )?;

        let records = self.state_history.transitions();

        if let Some(first) = records.first() {
            if first.from_state != DealState::INITIAL {
                return Err(IntegrityError::WrongInitialState {
                    found: first.from_state,
                });
            }
        }

        for (index, record) in records.iter().enumerate() {
            if !table::permits(record.from_state, record.to_state) {
                return Err(IntegrityError::IllegalEdge {
                    index,
                    from: record.from_state,
                    to: record.to_state,
                });
            }
        }

        for (index, pair) in records.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.from_state != prev.to_state {
                return Err(IntegrityError::BrokenChain {
                    index: index + 1,
                    expected: prev.to_state,
                    found: next.from_state,
                });
            }
            if next.timestamp < prev.timestamp {
                return Err(IntegrityError::TimestampRegression { index: index + 1 });
            }
        }

        let expected = records
            .last()
            .map(|record| record.to_state)
            .unwrap_or(DealState::INITIAL);
        if expected != self.current_state {
            return Err(IntegrityError::StateMismatch {
                current: self.current_state,
                expected,
            });
        }

        Ok(())
    }
}

fn check_terms(
    deal_id: &DealId,
    identifiers: [(&'static str, &str); 4],
    purchase_percentage: f64,
    deal_value: f64,
) -> Result<(), DealTermsError> {
    if deal_id.as_str().trim().is_empty() {
        return Err(DealTermsError::BlankIdentifier { field: "deal_id" });
    }
    if let Some(&(field, _)) = identifiers.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(DealTermsError::BlankIdentifier { field });
    }

    let pct = purchase_percentage;
    if !pct.is_finite() || pct <= 0.0 || pct > 100.0 {
        return Err(DealTermsError::InvalidPurchasePercentage(pct));
    }
    if !deal_value.is_finite() || deal_value <= 0.0 {
        return Err(DealTermsError::InvalidDealValue(deal_value));
    }
    Ok(())
}
