//! Persistence seam for deals.

use crate::core::{DealContext, DealId};
use crate::snapshot::{DealSnapshot, SnapshotError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Storage abstraction so the service can be exercised against any backend.
///
/// Writes after creation go through [`compare_and_swap`](Self::compare_and_swap):
/// the store must check the stored version and replace the record as one
/// atomic step, otherwise two callers can both commit a transition computed
/// from the same state. The replacement must be the stored deal advanced by
/// exactly one transition.
pub trait DealStore: Send + Sync {
    fn insert(&self, deal: &DealContext) -> Result<(), StoreError>;
    fn load(&self, id: &DealId) -> Result<DealContext, StoreError>;
    fn compare_and_swap(&self, expected_version: u64, deal: &DealContext)
        -> Result<(), StoreError>;
    fn list_ids(&self) -> Result<Vec<DealId>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("deal {0} already exists")]
    AlreadyExists(DealId),

    #[error("deal {0} not found")]
    NotFound(DealId),

    #[error("deal {deal_id} is at version {actual}, expected {expected}")]
    VersionConflict {
        deal_id: DealId,
        expected: u64,
        actual: u64,
    },

    #[error("replacement for deal {0} is not a one-step successor of the stored deal")]
    NotASuccessor(DealId),

    #[error("stored snapshot is unusable: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

struct StoredDeal {
    version: u64,
    bytes: Vec<u8>,
}

/// Process-local store keeping each deal as a versioned binary snapshot.
///
/// Records are decoded and integrity-checked on every load, so nothing read
/// back from here can carry a history the engine would not have produced.
#[derive(Default)]
pub struct InMemoryDealStore {
    deals: Mutex<BTreeMap<DealId, StoredDeal>>,
}

impl InMemoryDealStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<DealId, StoredDeal>>, StoreError> {
        self.deals
            .lock()
            .map_err(|_| StoreError::Unavailable("deal store lock poisoned".to_string()))
    }

    fn encode(deal: &DealContext) -> Result<StoredDeal, StoreError> {
        Ok(StoredDeal {
            version: deal.version(),
            bytes: DealSnapshot::capture(deal).to_binary()?,
        })
    }
}

impl DealStore for InMemoryDealStore {
    fn insert(&self, deal: &DealContext) -> Result<(), StoreError> {
        let stored = Self::encode(deal)?;
        let mut deals = self.lock()?;
        if deals.contains_key(deal.deal_id()) {
            return Err(StoreError::AlreadyExists(deal.deal_id().clone()));
        }
        deals.insert(deal.deal_id().clone(), stored);
        Ok(())
    }

    fn load(&self, id: &DealId) -> Result<DealContext, StoreError> {
        let deals = self.lock()?;
        let stored = deals
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(DealSnapshot::from_binary(&stored.bytes)?.into_deal())
    }

    fn compare_and_swap(
        &self,
        expected_version: u64,
        deal: &DealContext,
    ) -> Result<(), StoreError> {
        let replacement = Self::encode(deal)?;
        let mut deals = self.lock()?;
        let current = deals
            .get_mut(deal.deal_id())
            .ok_or_else(|| StoreError::NotFound(deal.deal_id().clone()))?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                deal_id: deal.deal_id().clone(),
                expected: expected_version,
                actual: current.version,
            });
        }

        let stored = DealSnapshot::from_binary(&current.bytes)?.into_deal();
        if !deal.is_successor_of(&stored) {
            return Err(StoreError::NotASuccessor(deal.deal_id().clone()));
        }

        *current = replacement;
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<DealId>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
