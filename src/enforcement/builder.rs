//! Builder for request rules.

use crate::core::DealEvent;
use crate::enforcement::rules::{RequestCheck, RequestRules};
use crate::enforcement::violations::RequestViolation;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Fluent construction of [`RequestRules`].
///
/// Starts with no limits and no mandatory cancellation reason; use
/// [`RequestRules::from_config`] for the configured defaults.
pub struct RequestRulesBuilder {
    require_cancel_reason: bool,
    max_reason_len: Option<usize>,
    max_notes_len: Option<usize>,
    custom_checks: Vec<RequestCheck>,
}

impl RequestRulesBuilder {
    pub fn new() -> Self {
        Self {
            require_cancel_reason: false,
            max_reason_len: None,
            max_notes_len: None,
            custom_checks: Vec::new(),
        }
    }

    pub fn require_cancel_reason(mut self, required: bool) -> Self {
        self.require_cancel_reason = required;
        self
    }

    pub fn max_reason_len(mut self, max: usize) -> Self {
        self.max_reason_len = Some(max);
        self
    }

    pub fn max_notes_len(mut self, max: usize) -> Self {
        self.max_notes_len = Some(max);
        self
    }

    /// Append a check that reports its own violations.
    pub fn require<F>(mut self, check: F) -> Self
    where
        F: Fn(&DealEvent) -> Validation<(), NonEmptyVec<RequestViolation>> + Send + Sync + 'static,
    {
        self.custom_checks.push(Box::new(check));
        self
    }

    /// Append a check that fails with `CustomCheckFailed { message }` when
    /// `predicate` returns false.
    pub fn require_pred<F>(mut self, predicate: F, error_msg: String) -> Self
    where
        F: Fn(&DealEvent) -> bool + Send + Sync + 'static,
    {
        let check = move |event: &DealEvent| {
            if predicate(event) {
                Validation::success(())
            } else {
                Validation::fail(RequestViolation::CustomCheckFailed {
                    message: error_msg.clone(),
                })
            }
        };
        self.custom_checks.push(Box::new(check));
        self
    }

    pub fn build(self) -> RequestRules {
        RequestRules {
            require_cancel_reason: self.require_cancel_reason,
            max_reason_len: self.max_reason_len,
            max_notes_len: self.max_notes_len,
            custom_checks: self.custom_checks,
        }
    }
}

impl Default for RequestRulesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
