//! Validation of transition requests before they reach the engine.
//!
//! The engine only decides whether a move is legal. Rules about the shape
//! of a request, such as a cancellation needing a reason or notes staying
//! within a size limit, belong to the caller-facing layer. They are checked
//! here with Stillwater's `Validation`, which accumulates every violation
//! instead of stopping at the first one.
//!
//! # Example
//!
//! ```rust
//! use deal_workflow::core::DealEvent;
//! use deal_workflow::enforcement::{RequestRulesBuilder, RequestViolation};
//!
//! let rules = RequestRulesBuilder::new()
//!     .require_cancel_reason(true)
//!     .max_notes_len(280)
//!     .build();
//!
//! let result = rules.check(&DealEvent::Cancel {
//!     reason: String::new(),
//!     notes: None,
//! });
//! assert_eq!(result, Err(vec![RequestViolation::MissingCancelReason]));
//! ```

pub mod builder;
pub mod rules;
pub mod violations;

pub use builder::RequestRulesBuilder;
pub use rules::RequestRules;
pub use violations::RequestViolation;
