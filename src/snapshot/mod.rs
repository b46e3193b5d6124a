//! Persistable snapshots of a deal.
//!
//! A snapshot carries the full aggregate (identity, terms, current state
//! and history) together with a format version. Restoring one re-checks the
//! history invariants, so a tampered or truncated record is rejected instead
//! of being handed back to the engine.

use crate::core::DealContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable snapshot of one deal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealSnapshot {
    /// Snapshot format version
    pub format_version: u32,

    /// When the snapshot was taken
    pub saved_at: DateTime<Utc>,

    pub deal: DealContext,
}

impl DealSnapshot {
    pub fn capture(deal: &DealContext) -> Self {
        Self {
            format_version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            deal: deal.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the format version and the deal's history invariants.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.format_version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.format_version,
                supported: SNAPSHOT_VERSION,
            });
        }
        self.deal.verify_integrity()?;
        Ok(())
    }

    pub fn into_deal(self) -> DealContext {
        self.deal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deal::fixtures::locked_deal;
    use crate::core::{ActorId, DealEvent, DealEventWithActor, DealState, IntegrityError};
    use crate::engine::DealWorkflow;

    fn deal_with_history() -> DealContext {
        let workflow = DealWorkflow::new();
        let admin = ActorId::new("admin-1");
        let deal = workflow
            .transition(
                &locked_deal(),
                DealEventWithActor::new(
                    DealEvent::ConfirmLawyer {
                        notes: Some("lawyer engaged".into()),
                    },
                    admin.clone(),
                ),
            )
            .unwrap();
        workflow
            .transition(
                &deal,
                DealEventWithActor::new(DealEvent::CompleteDocs { notes: None }, admin),
            )
            .unwrap()
    }

    #[test]
    fn json_snapshot_restores_deal() {
        let deal = deal_with_history();
        let json = DealSnapshot::capture(&deal).to_json().unwrap();

        let restored = DealSnapshot::from_json(&json).unwrap().into_deal();

        assert_eq!(restored, deal);
        assert_eq!(restored.current_state(), DealState::PendingDocs);
    }

    #[test]
    fn binary_snapshot_restores_deal() {
        let deal = deal_with_history();
        let bytes = DealSnapshot::capture(&deal).to_binary().unwrap();

        let restored = DealSnapshot::from_binary(&bytes).unwrap();

        assert_eq!(restored.deal, deal);
        assert_eq!(restored.format_version, SNAPSHOT_VERSION);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut snapshot = DealSnapshot::capture(&locked_deal());
        snapshot.format_version = 99;
        let json = snapshot.to_json().unwrap();

        match DealSnapshot::from_json(&json) {
            Err(SnapshotError::UnsupportedVersion { found, supported }) => {
                assert_eq!(found, 99);
                assert_eq!(supported, SNAPSHOT_VERSION);
            }
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn state_edited_without_history_is_rejected() {
        let json = DealSnapshot::capture(&deal_with_history()).to_json().unwrap();
        let tampered = json.replace(
            "\"current_state\": \"pending_docs\"",
            "\"current_state\": \"completed\"",
        );
        assert_ne!(json, tampered);

        assert!(matches!(
            DealSnapshot::from_json(&tampered),
            Err(SnapshotError::Integrity(_))
        ));
    }

    #[test]
    fn history_with_illegal_edge_is_rejected() {
        let json = DealSnapshot::capture(&deal_with_history()).to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let transitions = value["deal"]["state_history"]["transitions"]
            .as_array_mut()
            .unwrap();
        transitions.truncate(1);
        transitions[0]["to_state"] = serde_json::json!("archived");
        value["deal"]["current_state"] = serde_json::json!("archived");

        match DealSnapshot::from_json(&value.to_string()) {
            Err(SnapshotError::Integrity(IntegrityError::IllegalEdge { index, from, to })) => {
                assert_eq!(index, 0);
                assert_eq!(from, DealState::Locked);
                assert_eq!(to, DealState::Archived);
            }
            other => panic!("expected IllegalEdge, got {other:?}"),
        }
    }

    #[test]
    fn tampered_terms_are_rejected() {
        let json = DealSnapshot::capture(&deal_with_history()).to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["deal"]["purchase_percentage"] = serde_json::json!(-500.0);
        value["deal"]["deal_id"] = serde_json::json!("");

        assert!(matches!(
            DealSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::Integrity(IntegrityError::InvalidTerms(_)))
        ));

        let deal: DealContext = serde_json::from_value(value["deal"].clone()).unwrap();
        let bytes = DealSnapshot::capture(&deal).to_binary().unwrap();
        assert!(matches!(
            DealSnapshot::from_binary(&bytes),
            Err(SnapshotError::Integrity(IntegrityError::InvalidTerms(_)))
        ));
    }

    #[test]
    fn garbage_input_fails_to_deserialize() {
        assert!(matches!(
            DealSnapshot::from_binary(&[0xff, 0x00, 0x13]),
            Err(SnapshotError::DeserializationFailed(_))
        ));
        assert!(matches!(
            DealSnapshot::from_json("{"),
            Err(SnapshotError::DeserializationFailed(_))
        ));
    }
}
