//! Business events and the acting identity attached to them.

use super::state::DealState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the administrator who triggered a transition.
///
/// Supplied by the authorization boundary, never by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank identifiers are treated as missing.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminant of a [`DealEvent`], used as the transition table key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    ConfirmLawyer,
    CompleteDocs,
    ReceiveFunds,
    VerifyFunds,
    CompleteDeal,
    GoBack,
    Cancel,
    Archive,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::ConfirmLawyer,
        EventKind::CompleteDocs,
        EventKind::ReceiveFunds,
        EventKind::VerifyFunds,
        EventKind::CompleteDeal,
        EventKind::GoBack,
        EventKind::Cancel,
        EventKind::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfirmLawyer => "CONFIRM_LAWYER",
            Self::CompleteDocs => "COMPLETE_DOCS",
            Self::ReceiveFunds => "RECEIVE_FUNDS",
            Self::VerifyFunds => "VERIFY_FUNDS",
            Self::CompleteDeal => "COMPLETE_DEAL",
            Self::GoBack => "GO_BACK",
            Self::Cancel => "CANCEL",
            Self::Archive => "ARCHIVE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to move a deal along its workflow.
///
/// Serialized with a `type` tag so API payloads read like
/// `{"type": "GO_BACK", "to_state": "pending_lawyer"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealEvent {
    ConfirmLawyer {
        notes: Option<String>,
    },
    CompleteDocs {
        notes: Option<String>,
    },
    ReceiveFunds {
        notes: Option<String>,
    },
    VerifyFunds {
        notes: Option<String>,
    },
    CompleteDeal {
        notes: Option<String>,
    },
    GoBack {
        to_state: DealState,
        notes: Option<String>,
    },
    Cancel {
        reason: String,
        notes: Option<String>,
    },
    Archive {
        notes: Option<String>,
    },
}

impl DealEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ConfirmLawyer { .. } => EventKind::ConfirmLawyer,
            Self::CompleteDocs { .. } => EventKind::CompleteDocs,
            Self::ReceiveFunds { .. } => EventKind::ReceiveFunds,
            Self::VerifyFunds { .. } => EventKind::VerifyFunds,
            Self::CompleteDeal { .. } => EventKind::CompleteDeal,
            Self::GoBack { .. } => EventKind::GoBack,
            Self::Cancel { .. } => EventKind::Cancel,
            Self::Archive { .. } => EventKind::Archive,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            Self::ConfirmLawyer { notes }
            | Self::CompleteDocs { notes }
            | Self::ReceiveFunds { notes }
            | Self::VerifyFunds { notes }
            | Self::CompleteDeal { notes }
            | Self::GoBack { notes, .. }
            | Self::Cancel { notes, .. }
            | Self::Archive { notes } => notes.as_deref(),
        }
    }

    /// Annotation written to the audit record.
    ///
    /// A cancellation records its reason, followed by the caller's notes
    /// when both are present.
    pub fn audit_notes(&self) -> Option<String> {
        match self {
            Self::Cancel { reason, notes } => {
                let reason = reason.trim();
                match (reason.is_empty(), notes.as_deref()) {
                    (true, notes) => notes.map(str::to_string),
                    (false, None) => Some(reason.to_string()),
                    (false, Some(notes)) => Some(format!("{reason}; {notes}")),
                }
            }
            other => other.notes().map(str::to_string),
        }
    }

    /// An event of the given kind with no notes.
    ///
    /// `Cancel` gets an empty reason. `GoBack` has no meaningful default
    /// target, so `None` is returned for it unless `to_state` is provided.
    pub fn bare(kind: EventKind, to_state: Option<DealState>) -> Option<Self> {
        let event = match kind {
            EventKind::ConfirmLawyer => Self::ConfirmLawyer { notes: None },
            EventKind::CompleteDocs => Self::CompleteDocs { notes: None },
            EventKind::ReceiveFunds => Self::ReceiveFunds { notes: None },
            EventKind::VerifyFunds => Self::VerifyFunds { notes: None },
            EventKind::CompleteDeal => Self::CompleteDeal { notes: None },
            EventKind::GoBack => Self::GoBack {
                to_state: to_state?,
                notes: None,
            },
            EventKind::Cancel => Self::Cancel {
                reason: String::new(),
                notes: None,
            },
            EventKind::Archive => Self::Archive { notes: None },
        };
        Some(event)
    }
}

/// An event paired with the identity of the administrator who issued it.
///
/// The actor is optional at the type level so that integration mistakes
/// surface as a `missing_actor` error instead of a default identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealEventWithActor {
    pub event: DealEvent,
    pub actor: Option<ActorId>,
}

impl DealEventWithActor {
    pub fn new(event: DealEvent, actor: ActorId) -> Self {
        Self {
            event,
            actor: Some(actor),
        }
    }

    pub fn anonymous(event: DealEvent) -> Self {
        Self { event, actor: None }
    }

    /// The actor, if present and not blank.
    pub fn actor(&self) -> Option<&ActorId> {
        self.actor.as_ref().filter(|actor| !actor.is_blank())
    }
}
