//! Request-shape violations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems with the shape of a transition request, found before the
/// engine is invoked.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum RequestViolation {
    #[error("a cancellation reason is required")]
    MissingCancelReason,

    #[error("cancellation reason is {len} characters long (max {max})")]
    ReasonTooLong { max: usize, len: usize },

    #[error("notes are {len} characters long (max {max})")]
    NotesTooLong { max: usize, len: usize },

    #[error("request check failed: {message}")]
    CustomCheckFailed { message: String },
}
