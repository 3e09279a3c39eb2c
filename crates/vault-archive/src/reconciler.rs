//! Resolution of pending deposit records.

use std::sync::Arc;

use tracing::{debug, info, warn};

use vault_connector::{ArchiveConnector, ResolvedTicket, TicketResolution, TicketResolver};
use vault_graph::{DeliverableUnit, DuRole};
use vault_mapper::StateSearcher;
use vault_records::DepositRecordStore;
use vault_types::{DepositRecord, DepositStatus};

use crate::error::{ArchiveResult, ReconciliationError};

/// What one reconciliation step did to a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The ticket is not resolved yet; the record stays pending.
    StillPending,
    Deposited,
    Failed,
    /// The record was already terminal; nothing changed.
    AlreadyTerminal,
}

impl ReconcileOutcome {
    pub fn status(&self) -> Option<DepositStatus> {
        match self {
            Self::StillPending => Some(DepositStatus::Pending),
            Self::Deposited => Some(DepositStatus::Deposited),
            Self::Failed => Some(DepositStatus::Failed),
            Self::AlreadyTerminal => None,
        }
    }
}

/// Counts from one pass over all pending records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub examined: usize,
    pub deposited: usize,
    pub failed: usize,
    pub still_pending: usize,
    /// Skipped because another operation held the object's lock.
    pub busy: usize,
    /// Left pending after a per-record error.
    pub errored: usize,
}

impl PollSummary {
    pub(crate) fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::StillPending => self.still_pending += 1,
            ReconcileOutcome::Deposited => self.deposited += 1,
            ReconcileOutcome::Failed => self.failed += 1,
            ReconcileOutcome::AlreadyTerminal => {}
        }
    }
}

/// Moves pending records to DEPOSITED or FAILED once their ticket resolves.
///
/// The reconciler does no locking of its own; callers hold the record's
/// object lock around [`DepositReconciler::reconcile`].
pub struct DepositReconciler {
    records: Arc<dyn DepositRecordStore>,
    connector: Arc<dyn ArchiveConnector>,
    resolver: Arc<dyn TicketResolver>,
}

impl DepositReconciler {
    pub fn new(
        records: Arc<dyn DepositRecordStore>,
        connector: Arc<dyn ArchiveConnector>,
        resolver: Arc<dyn TicketResolver>,
    ) -> Self {
        Self {
            records,
            connector,
            resolver,
        }
    }

    /// Run one reconciliation step for `record`.
    ///
    /// Record-store failures surface as [`ArchiveError::Records`]
    /// (catastrophic); everything else as a per-record
    /// [`ReconciliationError`].
    ///
    /// [`ArchiveError::Records`]: crate::error::ArchiveError::Records
    pub async fn reconcile(&self, record: &DepositRecord) -> ArchiveResult<ReconcileOutcome> {
        if record.is_terminal() {
            return Ok(ReconcileOutcome::AlreadyTerminal);
        }

        let resolution = self
            .resolver
            .resolve(&record.ticket)
            .await
            .map_err(ReconciliationError::Ticket)?;
        let ticket = match resolution {
            TicketResolution::Unresolved => {
                debug!(deposit_id = %record.deposit_id, "ticket not resolved yet");
                return Ok(ReconcileOutcome::StillPending);
            }
            TicketResolution::Resolved(ticket) => ticket,
        };

        if !ticket.successful {
            let reason = ticket
                .reason
                .unwrap_or_else(|| "deposit rejected by archive".to_string());
            let failed = record.failed(&reason).map_err(ReconciliationError::from)?;
            self.records.update(&failed)?;
            info!(
                deposit_id = %record.deposit_id,
                business_id = %record.business_id,
                reason = %reason,
                "deposit FAILED"
            );
            return Ok(ReconcileOutcome::Failed);
        }

        let (root, state) = locate_units(record, &ticket)?;

        let archive_id = if state.predecessor.is_some() {
            // Version update: the store-assigned root comes from the archive.
            let current = StateSearcher::new(self.connector.as_ref())
                .current_state(&record.business_id, record.object_type)
                .await
                .map_err(ReconciliationError::from)?
                .ok_or_else(|| ReconciliationError::LineageNotFound(record.business_id.clone()))?;
            if state.lineage() != Some(&current.root.id) {
                warn!(
                    deposit_id = %record.deposit_id,
                    searched_root = %current.root.id,
                    fragment_root = ?state.lineage(),
                    "archived root differs from the submitted lineage"
                );
            }
            current.root.id
        } else {
            root.id.clone()
        };

        let deposited = record
            .deposited(archive_id, state.id.clone())
            .map_err(ReconciliationError::from)?;
        self.records.update(&deposited)?;
        info!(
            deposit_id = %record.deposit_id,
            business_id = %record.business_id,
            archive_id = ?deposited.archive_id,
            state_id = %state.id,
            "deposit DEPOSITED"
        );
        Ok(ReconcileOutcome::Deposited)
    }
}

/// The deposit's top-most DU and the State DU it submitted.
///
/// First deposits name their Root DU as the ticket's root entity; updates
/// carry no Root DU and name the new State DU itself.
fn locate_units<'t>(
    record: &DepositRecord,
    ticket: &'t ResolvedTicket,
) -> Result<(&'t DeliverableUnit, &'t DeliverableUnit), ReconciliationError> {
    let root_id = ticket
        .root_entity
        .as_ref()
        .ok_or(ReconciliationError::NoRootDu(record.deposit_id))?;
    let root = ticket
        .entities
        .du(root_id)
        .map_err(|_| ReconciliationError::NoRootDu(record.deposit_id))?;

    let state = match root.du_type.role {
        DuRole::State => root,
        DuRole::Root => ticket
            .entities
            .units_with_role(DuRole::State)
            .find(|du| du.object_type() == record.object_type && du.lineage() == Some(&root.id))
            .ok_or(ReconciliationError::NoStateDu(record.deposit_id))?,
    };
    Ok((root, state))
}

#[cfg(test)]
mod tests {
    use vault_connector::{FaultPlan, InMemoryArchive};
    use vault_mapper::{MapperRegistry, Placement};
    use vault_records::InMemoryRecordStore;
    use vault_types::{BusinessObject, Collection, DepositId, ObjectType, TicketId};

    use super::*;
    use crate::error::ArchiveError;

    struct Fixture {
        archive: Arc<InMemoryArchive>,
        records: Arc<InMemoryRecordStore>,
        reconciler: DepositReconciler,
    }

    fn fixture(resolve_after: u32) -> Fixture {
        let archive = Arc::new(InMemoryArchive::with_resolve_after(resolve_after));
        let records = Arc::new(InMemoryRecordStore::new());
        let reconciler = DepositReconciler::new(records.clone(), archive.clone(), archive.clone());
        Fixture {
            archive,
            records,
            reconciler,
        }
    }

    async fn submit(f: &Fixture, object: BusinessObject) -> DepositRecord {
        let registry = MapperRegistry::standard();
        let package = registry
            .for_object(&object)
            .unwrap()
            .to_package(&object, &Placement::default())
            .unwrap();
        let ticket = f.archive.deposit_package(&package).await.unwrap();
        let record = DepositRecord::pending(
            DepositId::new(),
            object.id().clone(),
            None,
            object.object_type(),
            ticket,
        );
        f.records.add(&record).unwrap();
        record
    }

    #[tokio::test]
    async fn unresolved_ticket_leaves_record_pending() {
        let f = fixture(1);
        let record = submit(&f, Collection::new("C1", "Ocean").into()).await;
        let outcome = f.reconciler.reconcile(&record).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::StillPending);
        let stored = f.records.lookup(&record.deposit_id).unwrap().unwrap();
        assert_eq!(stored.status, DepositStatus::Pending);
    }

    #[tokio::test]
    async fn first_deposit_takes_ids_from_fragment() {
        let f = fixture(0);
        let record = submit(&f, Collection::new("C1", "Ocean").into()).await;
        let outcome = f.reconciler.reconcile(&record).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Deposited);

        let stored = f.records.lookup(&record.deposit_id).unwrap().unwrap();
        let root = stored.archive_id.unwrap();
        let state = stored.state_id.unwrap();
        assert_ne!(root, state);
        let root_du = f.archive.entity(&root).unwrap();
        assert!(root_du.as_du().unwrap().is_root());
    }

    #[tokio::test]
    async fn failed_ticket_records_reason() {
        let f = fixture(0);
        f.archive.set_faults(FaultPlan {
            fail_tickets: Some("virus detected".into()),
            ..FaultPlan::default()
        });
        let record = submit(&f, Collection::new("C1", "Ocean").into()).await;
        let outcome = f.reconciler.reconcile(&record).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Failed);
        let stored = f.records.lookup(&record.deposit_id).unwrap().unwrap();
        assert_eq!(stored.status, DepositStatus::Failed);
        assert_eq!(stored.status_reason.as_deref(), Some("virus detected"));
    }

    #[tokio::test]
    async fn missing_root_entity_is_a_reconciliation_error() {
        let f = fixture(0);
        f.archive.set_faults(FaultPlan {
            omit_root_entity: true,
            ..FaultPlan::default()
        });
        let record = submit(&f, Collection::new("C1", "Ocean").into()).await;
        let err = f.reconciler.reconcile(&record).await.unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Reconciliation(ReconciliationError::NoRootDu(_))
        ));
        let stored = f.records.lookup(&record.deposit_id).unwrap().unwrap();
        assert_eq!(stored.status, DepositStatus::Pending);
    }

    #[tokio::test]
    async fn terminal_records_are_left_alone() {
        let f = fixture(0);
        let record = submit(&f, Collection::new("C1", "Ocean").into()).await;
        f.reconciler.reconcile(&record).await.unwrap();
        let stored = f.records.lookup(&record.deposit_id).unwrap().unwrap();

        let again = f.reconciler.reconcile(&stored).await.unwrap();
        assert_eq!(again, ReconcileOutcome::AlreadyTerminal);
        assert_eq!(f.records.lookup(&record.deposit_id).unwrap().unwrap(), stored);
    }

    #[tokio::test]
    async fn unknown_ticket_is_a_reconciliation_error() {
        let f = fixture(0);
        let record = DepositRecord::pending(
            DepositId::new(),
            "C1".into(),
            None,
            ObjectType::Collection,
            TicketId("ticket:lost".into()),
        );
        f.records.add(&record).unwrap();
        let err = f.reconciler.reconcile(&record).await.unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Reconciliation(ReconciliationError::Ticket(_))
        ));
        let stored = f.records.lookup(&record.deposit_id).unwrap().unwrap();
        assert_eq!(stored.status, DepositStatus::Pending);
    }
}
