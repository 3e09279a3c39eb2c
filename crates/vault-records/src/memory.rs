use std::sync::RwLock;

use vault_types::{BusinessId, DepositId, DepositRecord, DepositStatus, ObjectType};

use crate::error::RecordResult;
use crate::index::RecordIndex;
use crate::traits::DepositRecordStore;

/// In-memory deposit-record store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock`
/// and cloned on read/write.
pub struct InMemoryRecordStore {
    index: RwLock<RecordIndex>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(RecordIndex::default()),
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.index.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DepositRecordStore for InMemoryRecordStore {
    fn add(&self, record: &DepositRecord) -> RecordResult<()> {
        let mut index = self.index.write().expect("lock poisoned");
        index.check_add(record)?;
        index.apply(record.clone());
        Ok(())
    }

    fn update(&self, record: &DepositRecord) -> RecordResult<()> {
        let mut index = self.index.write().expect("lock poisoned");
        if index.check_update(record)? {
            index.apply(record.clone());
        }
        Ok(())
    }

    fn lookup(&self, deposit_id: &DepositId) -> RecordResult<Option<DepositRecord>> {
        Ok(self.index.read().expect("lock poisoned").get(deposit_id))
    }

    fn list(
        &self,
        object_type: Option<ObjectType>,
        status: Option<DepositStatus>,
    ) -> RecordResult<Vec<DepositRecord>> {
        Ok(self
            .index
            .read()
            .expect("lock poisoned")
            .list(object_type, status))
    }

    fn list_for_object(
        &self,
        business_id: &BusinessId,
        status: Option<DepositStatus>,
    ) -> RecordResult<Vec<DepositRecord>> {
        Ok(self
            .index
            .read()
            .expect("lock poisoned")
            .list_for_object(business_id, status))
    }

    fn lookup_children(&self, parent: &DepositId) -> RecordResult<Vec<DepositRecord>> {
        Ok(self.index.read().expect("lock poisoned").children(parent))
    }
}
