use vault_types::{BusinessId, DepositId, DepositRecord, DepositStatus, ObjectType};

use crate::error::RecordResult;

/// Persistent table of deposit attempts.
///
/// Listing operations return records in deposit order (timestamp, then
/// deposit id).
pub trait DepositRecordStore: Send + Sync {
    /// Add a new record. Fails if the deposit id is already present.
    fn add(&self, record: &DepositRecord) -> RecordResult<()>;

    /// Replace an existing record. Fails if the record is missing, or if
    /// the stored record is terminal and `record` differs from it.
    fn update(&self, record: &DepositRecord) -> RecordResult<()>;

    fn lookup(&self, deposit_id: &DepositId) -> RecordResult<Option<DepositRecord>>;

    /// Records filtered by object type and status; `None` matches all.
    fn list(
        &self,
        object_type: Option<ObjectType>,
        status: Option<DepositStatus>,
    ) -> RecordResult<Vec<DepositRecord>>;

    /// Every attempt for one business object, optionally by status.
    fn list_for_object(
        &self,
        business_id: &BusinessId,
        status: Option<DepositStatus>,
    ) -> RecordResult<Vec<DepositRecord>>;

    /// Records whose parent deposit id is `parent`.
    fn lookup_children(&self, parent: &DepositId) -> RecordResult<Vec<DepositRecord>>;
}
