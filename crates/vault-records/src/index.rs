//! Record table plus secondary indices, shared by both store backends.

use std::collections::HashMap;

use vault_types::{BusinessId, DepositId, DepositRecord, DepositStatus, ObjectType};

use crate::error::{RecordError, RecordResult};

#[derive(Default)]
pub(crate) struct RecordIndex {
    records: HashMap<DepositId, DepositRecord>,
    by_object: HashMap<BusinessId, Vec<DepositId>>,
    by_parent: HashMap<DepositId, Vec<DepositId>>,
}

impl RecordIndex {
    pub(crate) fn check_add(&self, record: &DepositRecord) -> RecordResult<()> {
        if self.records.contains_key(&record.deposit_id) {
            return Err(RecordError::DuplicateDeposit(record.deposit_id));
        }
        Ok(())
    }

    /// Returns `Ok(false)` when the update would not change anything.
    pub(crate) fn check_update(&self, record: &DepositRecord) -> RecordResult<bool> {
        let existing = self
            .records
            .get(&record.deposit_id)
            .ok_or(RecordError::NotFound(record.deposit_id))?;
        if existing == record {
            return Ok(false);
        }
        if existing.is_terminal() {
            return Err(RecordError::TerminalRecord {
                deposit_id: existing.deposit_id,
                status: existing.status,
            });
        }
        Ok(true)
    }

    /// Insert or replace without checks. Indices are keyed on fields that
    /// do not change between versions of a record, so replacing only has
    /// to register new keys once.
    pub(crate) fn apply(&mut self, record: DepositRecord) {
        let id = record.deposit_id;
        if !self.records.contains_key(&id) {
            self.by_object
                .entry(record.business_id.clone())
                .or_default()
                .push(id);
            if let Some(parent) = record.parent_deposit_id {
                self.by_parent.entry(parent).or_default().push(id);
            }
        }
        self.records.insert(id, record);
    }

    pub(crate) fn get(&self, id: &DepositId) -> Option<DepositRecord> {
        self.records.get(id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn list(
        &self,
        object_type: Option<ObjectType>,
        status: Option<DepositStatus>,
    ) -> Vec<DepositRecord> {
        let matched = self
            .records
            .values()
            .filter(|r| object_type.map_or(true, |t| r.object_type == t))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        sorted(matched)
    }

    pub(crate) fn list_for_object(
        &self,
        business_id: &BusinessId,
        status: Option<DepositStatus>,
    ) -> Vec<DepositRecord> {
        let matched = self
            .resolve(self.by_object.get(business_id))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect();
        sorted(matched)
    }

    pub(crate) fn children(&self, parent: &DepositId) -> Vec<DepositRecord> {
        sorted(self.resolve(self.by_parent.get(parent)).collect())
    }

    fn resolve<'a>(
        &'a self,
        ids: Option<&'a Vec<DepositId>>,
    ) -> impl Iterator<Item = DepositRecord> + 'a {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id).cloned())
    }
}

fn sorted(mut records: Vec<DepositRecord>) -> Vec<DepositRecord> {
    records.sort_by(|a, b| {
        a.deposit_timestamp
            .cmp(&b.deposit_timestamp)
            .then_with(|| a.deposit_id.cmp(&b.deposit_id))
    });
    records
}
