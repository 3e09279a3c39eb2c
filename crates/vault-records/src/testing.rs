//! Behaviour shared by every store backend, run against each one.

use chrono::{Duration, Utc};
use vault_types::{
    BusinessId, DepositId, DepositRecord, DepositStatus, EntityId, ObjectType, TicketId,
};

use crate::error::RecordError;
use crate::traits::DepositRecordStore;

pub(crate) fn pending(business_id: &str, parent: Option<DepositId>) -> DepositRecord {
    DepositRecord::pending(
        DepositId::new(),
        BusinessId::new(business_id),
        parent,
        ObjectType::Collection,
        TicketId(format!("ticket:{business_id}")),
    )
}

pub(crate) fn add_and_lookup(store: &dyn DepositRecordStore) {
    let record = pending("C1", None);
    store.add(&record).unwrap();
    assert_eq!(store.lookup(&record.deposit_id).unwrap(), Some(record));
    assert_eq!(store.lookup(&DepositId::new()).unwrap(), None);
}

pub(crate) fn duplicate_add_is_rejected(store: &dyn DepositRecordStore) {
    let record = pending("C1", None);
    store.add(&record).unwrap();
    let err = store.add(&record).unwrap_err();
    assert!(matches!(err, RecordError::DuplicateDeposit(id) if id == record.deposit_id));
}

pub(crate) fn terminal_records_are_frozen(store: &dyn DepositRecordStore) {
    let record = pending("C1", None);
    store.add(&record).unwrap();
    let done = record
        .deposited(EntityId::new("du:r1"), EntityId::new("du:s1"))
        .unwrap();
    store.update(&done).unwrap();

    // Re-writing the identical terminal record is a no-op.
    store.update(&done).unwrap();

    // Any change to a terminal record is refused.
    let mut reverted = done.clone();
    reverted.status = DepositStatus::Pending;
    let err = store.update(&reverted).unwrap_err();
    assert!(matches!(
        err,
        RecordError::TerminalRecord {
            status: DepositStatus::Deposited,
            ..
        }
    ));
    assert_eq!(store.lookup(&record.deposit_id).unwrap(), Some(done));
}

pub(crate) fn update_of_missing_record_fails(store: &dyn DepositRecordStore) {
    let err = store.update(&pending("C1", None)).unwrap_err();
    assert!(matches!(err, RecordError::NotFound(_)));
}

pub(crate) fn listing_filters_and_orders(store: &dyn DepositRecordStore) {
    let mut older = pending("C1", None);
    older.deposit_timestamp = Utc::now() - Duration::seconds(60);
    let newer = pending("C1", None);
    let mut item = pending("D1", None);
    item.object_type = ObjectType::DataItem;

    store.add(&newer).unwrap();
    store.add(&older).unwrap();
    store.add(&item).unwrap();
    store
        .update(&older.failed("rejected").unwrap())
        .unwrap();

    let c1 = store.list_for_object(&BusinessId::new("C1"), None).unwrap();
    let ids: Vec<_> = c1.iter().map(|r| r.deposit_id).collect();
    assert_eq!(ids, vec![older.deposit_id, newer.deposit_id]);

    let pending_c1 = store
        .list_for_object(&BusinessId::new("C1"), Some(DepositStatus::Pending))
        .unwrap();
    assert_eq!(pending_c1.len(), 1);
    assert_eq!(pending_c1[0].deposit_id, newer.deposit_id);

    assert_eq!(store.list(None, None).unwrap().len(), 3);
    assert_eq!(store.list(Some(ObjectType::DataItem), None).unwrap().len(), 1);
    assert_eq!(
        store
            .list(Some(ObjectType::Collection), Some(DepositStatus::Failed))
            .unwrap()
            .len(),
        1
    );
    assert!(store
        .list_for_object(&BusinessId::new("unknown"), None)
        .unwrap()
        .is_empty());
}

pub(crate) fn children_by_parent_deposit(store: &dyn DepositRecordStore) {
    let parent = pending("D1", None);
    let child_a = pending("F1", Some(parent.deposit_id));
    let child_b = pending("F2", Some(parent.deposit_id));
    let unrelated = pending("F3", None);
    for r in [&parent, &child_a, &child_b, &unrelated] {
        store.add(r).unwrap();
    }
    let children = store.lookup_children(&parent.deposit_id).unwrap();
    let mut ids: Vec<_> = children.iter().map(|r| r.business_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["F1", "F2"]);
    assert!(store.lookup_children(&child_a.deposit_id).unwrap().is_empty());
}
