//! Request rules evaluated with `Validation`.

use crate::config::WorkflowConfig;
use crate::core::DealEvent;
use crate::enforcement::violations::RequestViolation;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Caller-supplied check run after the built-in rules.
pub type RequestCheck =
    Box<dyn Fn(&DealEvent) -> Validation<(), NonEmptyVec<RequestViolation>> + Send + Sync>;

/// Shape rules a request must satisfy before it reaches the engine.
///
/// Every failing rule is reported, not just the first one.
pub struct RequestRules {
    pub(crate) require_cancel_reason: bool,
    pub(crate) max_reason_len: Option<usize>,
    pub(crate) max_notes_len: Option<usize>,
    pub(crate) custom_checks: Vec<RequestCheck>,
}

impl RequestRules {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            require_cancel_reason: config.require_cancel_reason,
            max_reason_len: Some(config.max_reason_len),
            max_notes_len: Some(config.max_notes_len),
            custom_checks: Vec::new(),
        }
    }

    /// Run every rule against `event`.
    pub fn enforce(&self, event: &DealEvent) -> Validation<(), NonEmptyVec<RequestViolation>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<RequestViolation>>> = Vec::new();

        if let DealEvent::Cancel { reason, .. } = event {
            if self.require_cancel_reason {
                checks.push(if reason.trim().is_empty() {
                    Validation::fail(RequestViolation::MissingCancelReason)
                } else {
                    Validation::success(())
                });
            }

            if let Some(max) = self.max_reason_len {
                checks.push(within_limit(reason, max, |max, len| {
                    RequestViolation::ReasonTooLong { max, len }
                }));
            }
        }

        if let (Some(max), Some(notes)) = (self.max_notes_len, event.notes()) {
            checks.push(within_limit(notes, max, |max, len| {
                RequestViolation::NotesTooLong { max, len }
            }));
        }

        for check_fn in &self.custom_checks {
            checks.push(check_fn(event));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// [`enforce`](Self::enforce) flattened into a `Result`.
    pub fn check(&self, event: &DealEvent) -> Result<(), Vec<RequestViolation>> {
        match self.enforce(event) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
        }
    }
}

impl Default for RequestRules {
    fn default() -> Self {
        Self::from_config(&WorkflowConfig::default())
    }
}

fn within_limit(
    text: &str,
    max: usize,
    violation: impl FnOnce(usize, usize) -> RequestViolation,
) -> Validation<(), NonEmptyVec<RequestViolation>> {
    let len = text.chars().count();
    if len > max {
        Validation::fail(violation(max, len))
    } else {
        Validation::success(())
    }
}
